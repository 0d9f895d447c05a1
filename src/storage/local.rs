use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    storage::FileStorage,
};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("UNSAFE_FILENAME_CHARS is a valid regex pattern")
});

const MAX_FILENAME_LEN: usize = 120;

pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        return "upload".to_string();
    }

    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}

pub struct LocalFileStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.storage_root, &config.storage_public_url)
    }

    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(AppError::ValidationError(format!(
                "Invalid storage path '{}'",
                relative
            )));
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, dir: &str, filename: &str, bytes: &[u8]) -> AppResult<String> {
        let relative = format!(
            "{}/{}-{}",
            dir.trim_matches('/'),
            Uuid::new_v4(),
            sanitize_filename(filename)
        );
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        log::debug!("Stored {} bytes at {}", bytes.len(), relative);
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path.trim_start_matches('/'))
    }
}
