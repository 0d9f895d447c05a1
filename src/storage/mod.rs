pub mod local;

use async_trait::async_trait;

use crate::errors::AppResult;

pub use local::LocalFileStorage;

/// A file part read from an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Where uploaded submission and material files live. Paths are relative to the storage root.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` under `dir` and returns the relative path it was written to.
    async fn store(&self, dir: &str, filename: &str, bytes: &[u8]) -> AppResult<String>;
    async fn delete(&self, path: &str) -> AppResult<()>;
    async fn exists(&self, path: &str) -> AppResult<bool>;
    fn url_for(&self, path: &str) -> String;
}

/// Deletes a stored file, logging instead of failing.
pub async fn delete_quietly(storage: &dyn FileStorage, path: &str) {
    if let Err(e) = storage.delete(path).await {
        log::warn!("Failed to delete stored file '{}': {}", path, e);
    }
}
