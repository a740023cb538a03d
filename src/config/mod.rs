pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::{Result, ScanError};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "serial-scan")]
#[command(about = "Scan equipment serial numbers from a camera frame or an uploaded image")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Image file to upload instead of using the camera
    #[arg(long, conflicts_with = "camera_image")]
    pub image: Option<String>,

    /// Image file served as the camera's video feed
    #[arg(long)]
    pub camera_image: Option<String>,

    /// OCR endpoint, overrides recognition.endpoint from the config file
    #[arg(long)]
    pub ocr_endpoint: Option<String>,

    /// Inventory CSV, overrides inventory.csv_path from the config file
    #[arg(long)]
    pub inventory: Option<String>,

    /// Category filter applied to the inventory listing
    #[arg(long, default_value = "All")]
    pub category: String,

    /// Keep the candidate in the dialog instead of writing it to the search field
    #[arg(long)]
    pub no_accept: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system stats for each scan phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.image.is_none() && self.camera_image.is_none() {
            return Err(ScanError::MissingConfigError {
                field: "--image or --camera-image".to_string(),
            });
        }
        if let Some(path) = &self.image {
            validation::validate_path("--image", path)?;
        }
        if let Some(path) = &self.camera_image {
            validation::validate_path("--camera-image", path)?;
        }
        if let Some(endpoint) = &self.ocr_endpoint {
            validation::validate_url("--ocr-endpoint", endpoint)?;
        }
        if let Some(path) = &self.inventory {
            validation::validate_file_extension("--inventory", path, &["csv"])?;
        }
        validation::validate_non_empty_string("--category", &self.category)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_requires_an_image_source() {
        let config = CliConfig::parse_from(["serial-scan"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["serial-scan", "--image", "label.jpg"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.category, "All");
    }

    #[test]
    fn test_image_and_camera_conflict() {
        let parsed = CliConfig::try_parse_from([
            "serial-scan",
            "--image",
            "a.jpg",
            "--camera-image",
            "b.jpg",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_rejects_bad_endpoint_and_inventory() {
        let config = CliConfig::parse_from([
            "serial-scan",
            "--camera-image",
            "frame.png",
            "--ocr-endpoint",
            "not-a-url",
        ]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from([
            "serial-scan",
            "--camera-image",
            "frame.png",
            "--inventory",
            "items.xlsx",
        ]);
        assert!(config.validate().is_err());
    }
}
