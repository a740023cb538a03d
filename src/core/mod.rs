pub mod acquisition;
pub mod capture;
pub mod extraction;
pub mod recognition;
pub mod session;
pub mod upload;

pub use crate::domain::model::{ImagePayload, RecognitionResult};
pub use crate::domain::ports::{CameraDevice, PreviewSurface, Storage, TextRecognizer, VideoStream};
pub use crate::utils::error::Result;
