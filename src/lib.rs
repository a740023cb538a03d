pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{camera::StillImageCamera, http::HttpRecognizer, storage::LocalStorage};
pub use app::{
    engine::{ScanEngine, ScanReport},
    inventory::InventoryCatalog,
    scan_terminal::ScanTerminal,
};
pub use config::toml_config::ScanConfig;
pub use crate::core::{
    extraction::{extract, CandidateExtractor},
    recognition::RecognitionInvoker,
    session::{CaptureSession, ScanState},
};
pub use utils::error::{Result, ScanError};
