use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::TryStreamExt;

use crate::{
    errors::{AppError, AppResult},
    storage::UploadedFile,
};

/// Text fields longer than this are refused while reading.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// What an upload form carried: at most one `file` part plus the requested text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// A text field, trimmed. Blank values count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Reads an upload form. The `file` part is only buffered when `accept_file` is set, and
/// only `text_fields` are kept; every other part is drained unread.
pub async fn read_upload_form(
    payload: &mut Multipart,
    accept_file: bool,
    text_fields: &[&str],
    max_file_bytes: usize,
) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" && accept_file {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or("upload")
                .to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if bytes.len() + chunk.len() > max_file_bytes {
                    return Err(AppError::ValidationError(format!(
                        "Uploaded file exceeds the limit of {} bytes",
                        max_file_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            form.file = Some(UploadedFile { filename, bytes });
        } else if text_fields.contains(&name.as_str()) {
            let mut raw = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if raw.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(AppError::ValidationError(format!(
                        "{} must be at most {} bytes",
                        name, MAX_TEXT_FIELD_BYTES
                    )));
                }
                raw.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(raw).map_err(|_| {
                AppError::ValidationError(format!("{} must be valid UTF-8", name))
            })?;
            form.fields.insert(name, text);
        } else {
            while field.try_next().await?.is_some() {}
        }
    }

    Ok(form)
}
