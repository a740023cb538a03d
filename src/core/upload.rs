use crate::domain::model::ImagePayload;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::validate_file_extension;

pub const DEFAULT_MAX_UPLOAD_MB: u64 = 10;
pub const MAX_UPLOAD_MB: u64 = 1024;
pub const DEFAULT_UPLOAD_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "heic"];

/// 上傳圖片的格式與大小限制
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_size_mb: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_bytes: max_size_mb.saturating_mul(1024 * 1024),
            allowed_extensions,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check_size(&self, file_name: &str, size: u64) -> Result<()> {
        if size == 0 {
            return Err(ScanError::InvalidUpload {
                file_name: file_name.to_string(),
                reason: "file is empty".to_string(),
            });
        }
        if size > self.max_bytes {
            return Err(ScanError::InvalidUpload {
                file_name: file_name.to_string(),
                reason: format!(
                    "file is {} bytes, limit is {} bytes",
                    size, self.max_bytes
                ),
            });
        }
        Ok(())
    }

    pub fn check_name(&self, file_name: &str) -> Result<()> {
        let allowed: Vec<&str> = self.allowed_extensions.iter().map(String::as_str).collect();
        validate_file_extension("upload", file_name, &allowed).map_err(|e| {
            ScanError::InvalidUpload {
                file_name: file_name.to_string(),
                reason: match e {
                    ScanError::InvalidConfigValueError { reason, .. } => reason,
                    other => other.to_string(),
                },
            }
        })
    }

    pub fn accept(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImagePayload> {
        self.check_name(file_name)?;
        self.check_size(file_name, bytes.len() as u64)?;
        Ok(ImagePayload::from_upload(file_name, bytes))
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_UPLOAD_MB,
            DEFAULT_UPLOAD_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        )
    }
}
