use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 相機偏好方向；掃描序號預設使用後鏡頭
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Rgb8,
    Rgba8,
}

impl FrameFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            FrameFormat::Rgb8 => 3,
            FrameFormat::Rgba8 => 4,
        }
    }
}

/// Raw frame read from a live video stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Camera,
    Upload { file_name: String },
}

/// Encoded image handed to the recognition engine.
///
/// Consumed by value on recognition so the bytes are not retained once the
/// call returns.
#[derive(Debug)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    source: PayloadSource,
}

impl ImagePayload {
    pub fn from_capture(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            source: PayloadSource::Camera,
        }
    }

    pub fn from_upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            source: PayloadSource::Upload {
                file_name: file_name.into(),
            },
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn source(&self) -> &PayloadSource {
        &self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionResult {
    pub text: String,
    /// 去重後的候選序號，保留首次出現順序
    pub candidates: Vec<String>,
    pub recognized_at: DateTime<Utc>,
}

impl RecognitionResult {
    pub fn primary_candidate(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }

    pub fn is_no_match(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Good,
    Maintenance,
    Repair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: u32,
    pub name: String,
    pub serial_number: String,
    pub category: String,
    pub location: String,
    pub quantity: u32,
    pub status: ItemStatus,
}
