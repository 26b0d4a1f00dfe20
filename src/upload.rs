use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{error::AppError, storage::UploadedFile};

/// Text fields plus at most one file from a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Reads the whole body. Only `file_field` is treated as a file; it must
    /// carry an `image/*` content type.
    pub async fn read(mut mp: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == file_field {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                if body.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err(AppError::validation("Only image files are allowed"));
                }
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    body,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether the field was sent at all, blank or not.
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}
