use crate::core::capture::{DEFAULT_JPEG_QUALITY, FALLBACK_HEIGHT, FALLBACK_WIDTH};
use crate::core::extraction::{CandidateExtractor, DEFAULT_MIN_LENGTH};
use crate::core::recognition::DEFAULT_LANGUAGE;
use crate::core::upload::{
    UploadPolicy, DEFAULT_MAX_UPLOAD_MB, DEFAULT_UPLOAD_EXTENSIONS, MAX_UPLOAD_MB,
};
use crate::domain::model::{FacingMode, VideoConstraints};
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub recognition: RecognitionConfig,
    pub extraction: ExtractionConfig,
    pub upload: UploadConfig,
    pub inventory: InventoryConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let constraints = VideoConstraints::default();
        Self {
            facing: constraints.facing_mode,
            ideal_width: constraints.ideal_width,
            ideal_height: constraints.ideal_height,
            fallback_width: FALLBACK_WIDTH,
            fallback_height: FALLBACK_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub endpoint: Option<String>,
    pub language: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_length: usize,
    pub require_digit: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            require_digit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_size_mb: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_UPLOAD_MB,
            allowed_extensions: DEFAULT_UPLOAD_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub csv_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl ScanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OCR_ENDPOINT})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(endpoint) = &self.recognition.endpoint {
            validation::validate_url("recognition.endpoint", endpoint)?;
        }
        validation::validate_non_empty_string("recognition.language", &self.recognition.language)?;
        if let Some(timeout) = self.recognition.timeout_seconds {
            validation::validate_range("recognition.timeout_seconds", timeout, 1, 600)?;
        }

        validation::validate_range("capture.jpeg_quality", self.capture.jpeg_quality, 1, 100)?;
        validation::validate_positive_number(
            "camera.fallback_width",
            self.camera.fallback_width as usize,
            1,
        )?;
        validation::validate_positive_number(
            "camera.fallback_height",
            self.camera.fallback_height as usize,
            1,
        )?;

        validation::validate_positive_number("extraction.min_length", self.extraction.min_length, 1)?;

        validation::validate_range("upload.max_size_mb", self.upload.max_size_mb, 1, MAX_UPLOAD_MB)?;
        if self.upload.allowed_extensions.is_empty() {
            return Err(ScanError::InvalidConfigValueError {
                field: "upload.allowed_extensions".to_string(),
                value: "[]".to_string(),
                reason: "At least one extension is required".to_string(),
            });
        }

        if let Some(path) = &self.inventory.csv_path {
            validation::validate_path("inventory.csv_path", path)?;
        }

        Ok(())
    }

    /// Endpoint is optional in the file but required to build a recognizer.
    pub fn recognition_endpoint(&self) -> Result<&String> {
        validation::validate_required_field("recognition.endpoint", &self.recognition.endpoint)
    }

    pub fn recognition_timeout(&self) -> Option<Duration> {
        self.recognition.timeout_seconds.map(Duration::from_secs)
    }

    pub fn video_constraints(&self) -> VideoConstraints {
        VideoConstraints {
            facing_mode: self.camera.facing,
            ideal_width: self.camera.ideal_width,
            ideal_height: self.camera.ideal_height,
        }
    }

    pub fn fallback_resolution(&self) -> (u32, u32) {
        (self.camera.fallback_width, self.camera.fallback_height)
    }

    pub fn candidate_extractor(&self) -> Result<CandidateExtractor> {
        CandidateExtractor::new(self.extraction.min_length, self.extraction.require_digit)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.upload.max_size_mb,
            self.upload.allowed_extensions.clone(),
        )
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for ScanConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ScanConfig::from_toml_str("").unwrap();

        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.fallback_resolution(), (1280, 720));
        assert_eq!(config.capture.jpeg_quality, 95);
        assert_eq!(config.recognition.language, "eng");
        assert_eq!(config.extraction.min_length, 5);
        assert_eq!(config.upload_policy().max_bytes(), 10 * 1024 * 1024);
        assert!(config.recognition_timeout().is_none());
        assert!(config.validate().is_ok());
        assert!(config.recognition_endpoint().is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[camera]
facing = "user"
ideal_width = 1280
ideal_height = 720

[capture]
jpeg_quality = 80

[recognition]
endpoint = "https://ocr.example.com/v1/recognize"
language = "eng"
timeout_seconds = 30

[extraction]
min_length = 6
require_digit = false

[upload]
max_size_mb = 5
allowed_extensions = ["jpg", "png"]

[monitoring]
enabled = true
"#;

        let config = ScanConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.video_constraints().facing_mode, FacingMode::User);
        assert_eq!(config.capture.jpeg_quality, 80);
        assert_eq!(
            config.recognition_endpoint().unwrap(),
            "https://ocr.example.com/v1/recognize"
        );
        assert_eq!(config.recognition_timeout(), Some(Duration::from_secs(30)));
        assert!(config.monitoring_enabled());
        assert_eq!(
            config.candidate_extractor().unwrap().extract("SERIAL abcde1"),
            vec!["SERIAL", "abcde1"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SERIAL_SCAN_TEST_OCR", "http://localhost:8884/ocr");

        let toml_content = r#"
[recognition]
endpoint = "${SERIAL_SCAN_TEST_OCR}"
"#;

        let config = ScanConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.recognition.endpoint.as_deref(),
            Some("http://localhost:8884/ocr")
        );

        std::env::remove_var("SERIAL_SCAN_TEST_OCR");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = ScanConfig::from_toml_str(
            r#"
[recognition]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_quality = ScanConfig::from_toml_str(
            r#"
[capture]
jpeg_quality = 0
"#,
        )
        .unwrap();
        assert!(bad_quality.validate().is_err());

        let no_extensions = ScanConfig::from_toml_str(
            r#"
[upload]
allowed_extensions = []
"#,
        )
        .unwrap();
        assert!(no_extensions.validate().is_err());
    }

    #[test]
    fn test_upload_size_upper_bound() {
        let huge = ScanConfig::from_toml_str(
            r#"
[upload]
max_size_mb = 9000000000000000000
"#,
        )
        .unwrap();
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("upload.max_size_mb"));
        // 未驗證的設定也不能讓位元組上限溢位
        assert_eq!(huge.upload_policy().max_bytes(), u64::MAX);

        let at_limit = ScanConfig::from_toml_str(
            r#"
[upload]
max_size_mb = 1024
"#,
        )
        .unwrap();
        assert!(at_limit.validate().is_ok());
        assert_eq!(at_limit.upload_policy().max_bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ScanConfig::from_toml_str("[camera\nfacing = ").unwrap_err();
        assert!(matches!(err, ScanError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[inventory]
csv_path = "./inventory.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = ScanConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.inventory.csv_path.as_deref(), Some("./inventory.csv"));
    }
}
