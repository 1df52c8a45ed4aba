//! Cover image storage on the local filesystem

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{
    config::UploadsConfig,
    error::{AppError, AppResult},
};

/// Writes uploaded images under a configured directory and maps them to
/// public URLs under a configured prefix.
#[derive(Clone, Debug)]
pub struct UploadService {
    dir: PathBuf,
    public_prefix: String,
    max_size_bytes: usize,
    allowed_extensions: Vec<String>,
}

/// Extension implied by a MIME type, used when the file name has none
fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

impl UploadService {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_size_bytes: config.max_size_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    fn resolve_extension(&self, file_name: Option<&str>, content_type: Option<&str>) -> AppResult<String> {
        let from_name = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let ext = from_name
            .or_else(|| content_type.and_then(extension_for_mime).map(String::from))
            .ok_or_else(|| AppError::Validation("Cannot determine image type".to_string()))?;

        if !self.allowed_extensions.contains(&ext) {
            return Err(AppError::Validation(format!(
                "File type .{} is not allowed (allowed: {})",
                ext,
                self.allowed_extensions.join(", ")
            )));
        }
        Ok(ext)
    }

    /// Validate and persist an image, returning its public URL
    pub async fn store_image(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_size_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.max_size_bytes
            )));
        }
        let ext = self.resolve_extension(file_name, content_type)?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;
        tokio::fs::write(self.dir.join(&stored_name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        tracing::info!(file = %stored_name, size = bytes.len(), "Image stored");
        Ok(format!("{}/{}", self.public_prefix, stored_name))
    }

    /// Remove a file previously returned by `store_image`. URLs outside the
    /// upload prefix are left alone. Failures are logged, not returned.
    pub async fn remove_managed(&self, url: &str) {
        let Some(name) = url
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            tracing::warn!(file = %name, "Failed to remove previous image: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &Path) -> UploadService {
        UploadService::new(&UploadsConfig {
            dir: dir.to_path_buf(),
            public_prefix: "/uploads/".to_string(),
            max_size_bytes: 16,
            allowed_extensions: vec!["png".to_string(), ".JPG".to_string()],
        })
    }

    #[tokio::test]
    async fn stores_and_removes() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let url = svc
            .store_image(Some("cover.PNG"), Some("image/png"), b"png-bytes")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.trim_start_matches("/uploads/");
        assert!(tmp.path().join(name).exists());
        svc.remove_managed(&url).await;
        assert!(!tmp.path().join(name).exists());
    }

    #[tokio::test]
    async fn falls_back_to_content_type() {
        let tmp = tempfile::tempdir().unwrap();
        let url = service(tmp.path())
            .store_image(None, Some("image/jpeg"), b"jpeg")
            .await
            .unwrap();
        assert!(url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn rejects_disallowed_type_and_oversize() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        assert!(matches!(
            svc.store_image(Some("x.exe"), None, b"MZ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.store_image(Some("x.png"), None, &[0u8; 17]).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.store_image(Some("x.png"), None, &[]).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn external_urls_are_not_touched() {
        let tmp = tempfile::tempdir().unwrap();
        service(tmp.path())
            .remove_managed("https://example.com/cover.png")
            .await;
    }
}
