use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Unable to access camera: {reason}")]
    CameraAccess { reason: String },

    #[error("Frame capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("Text recognition failed: {reason}")]
    RecognitionFailed { reason: String },

    #[error("Upload '{file_name}' rejected: {reason}")]
    InvalidUpload { file_name: String, reason: String },

    #[error("Cannot {action} while the scan session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Image codec error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Camera,
    Capture,
    Recognition,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::CameraAccess { .. } => ErrorCategory::Camera,
            ScanError::CaptureFailed { .. } | ScanError::ImageError(_) => ErrorCategory::Capture,
            ScanError::RecognitionFailed { .. } | ScanError::HttpError(_) => {
                ErrorCategory::Recognition
            }
            ScanError::InvalidUpload { .. }
            | ScanError::InvalidTransition { .. }
            | ScanError::CsvError(_) => ErrorCategory::Input,
            ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ScanError::IoError(_) | ScanError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// 會話內的錯誤都可由使用者重試，設定錯誤則無法繼續
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Camera | ErrorCategory::Capture | ErrorCategory::Recognition => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScanError::CameraAccess { .. } => {
                "Allow camera access and try again, or upload a photo instead"
            }
            ScanError::CaptureFailed { .. } | ScanError::ImageError(_) => {
                "Hold the camera steady and capture again"
            }
            ScanError::RecognitionFailed { .. } | ScanError::HttpError(_) => {
                "Try a clearer image, or upload a photo instead"
            }
            ScanError::InvalidUpload { .. } => "Upload a JPG, PNG or HEIC image of at most 10MB",
            ScanError::InvalidTransition { .. } => "Wait for the current step to finish",
            ScanError::CsvError(_) => "Check the inventory CSV header and row format",
            ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => "Fix the configuration file and rerun",
            ScanError::IoError(_) => "Check that the file exists and is readable",
            ScanError::SerializationError(_) => "Check the recognition engine response format",
        }
    }

    /// 顯示給使用者的訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::CameraAccess { .. } => "Unable to access camera".to_string(),
            ScanError::CaptureFailed { .. } | ScanError::ImageError(_) => {
                "Could not capture an image from the camera".to_string()
            }
            ScanError::RecognitionFailed { .. } | ScanError::HttpError(_) => {
                "Failed to read text from the image. Try a clearer image or upload a photo instead."
                    .to_string()
            }
            ScanError::InvalidUpload { reason, .. } => format!("Cannot use this image: {}", reason),
            ScanError::InvalidTransition { action, state } => {
                format!("Cannot {} right now ({})", action, state)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_message_is_stable() {
        let err = ScanError::CameraAccess {
            reason: "NotAllowedError".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Unable to access camera");
        assert_eq!(err.category(), ErrorCategory::Camera);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_recognition_error_suggests_upload() {
        let err = ScanError::RecognitionFailed {
            reason: "engine crashed".to_string(),
        };
        assert!(err.user_friendly_message().contains("clearer image"));
        assert!(err.recovery_suggestion().contains("upload"));
    }

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = ScanError::MissingConfigError {
            field: "recognition.endpoint".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("recognition.endpoint"));
    }
}
