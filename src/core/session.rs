//! Capture session state machine.
//!
//! ```text
//! Idle ──start──▶ CameraActive ──capture──▶ Processing ──▶ ResultFound
//!  │                 │                          │      ├──▶ NoMatch
//!  └────upload───────┴──────────────────────────┘      └──▶ Failed
//! ```
//!
//! The camera is only ever live in `CameraActive`; every transition out of it
//! stops the stream first.

use crate::core::acquisition::MediaAcquisition;
use crate::core::capture::FrameCapture;
use crate::core::recognition::RecognitionInvoker;
use crate::core::upload::UploadPolicy;
use crate::domain::model::{ImagePayload, PayloadSource, RecognitionResult};
use crate::utils::error::{ErrorCategory, Result, ScanError};
use std::fmt;

pub const NO_MATCH_MESSAGE: &str = "No serial number detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// Failure shown inline in the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&ScanError> for SessionFailure {
    fn from(err: &ScanError) -> Self {
        Self {
            category: err.category(),
            message: err.user_friendly_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    CameraActive,
    Processing { source: PayloadSource },
    ResultFound { text: String, candidates: Vec<String> },
    NoMatch { text: String },
    Failed(SessionFailure),
}

impl ScanState {
    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::CameraActive => "camera-active",
            ScanState::Processing { .. } => "processing",
            ScanState::ResultFound { .. } => "result-found",
            ScanState::NoMatch { .. } => "no-match",
            ScanState::Failed(_) => "failed",
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, ScanState::Processing { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScanState::Failed(_))
    }

    /// States offering "Scan Again".
    pub fn can_retry(&self) -> bool {
        matches!(
            self,
            ScanState::ResultFound { .. } | ScanState::NoMatch { .. } | ScanState::Failed(_)
        )
    }
}

/// Payload waiting for recognition, tagged with the session that produced it.
#[derive(Debug)]
pub struct PendingRecognition {
    session: SessionId,
    payload: ImagePayload,
}

impl PendingRecognition {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Runs recognition without borrowing the session, so the dialog can be
    /// closed while the call is in flight.
    pub async fn run(self, invoker: &RecognitionInvoker) -> RecognitionOutcome {
        let result = invoker.recognize(self.payload).await;
        RecognitionOutcome {
            session: self.session,
            result,
        }
    }
}

#[derive(Debug)]
pub struct RecognitionOutcome {
    session: SessionId,
    result: Result<RecognitionResult>,
}

impl RecognitionOutcome {
    pub fn new(session: SessionId, result: Result<RecognitionResult>) -> Self {
        Self { session, result }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn result(&self) -> &Result<RecognitionResult> {
        &self.result
    }
}

/// One scan attempt, from dialog open to accept or dismissal.
///
/// Dropping the session releases the camera.
pub struct CaptureSession {
    id: SessionId,
    state: ScanState,
    media: MediaAcquisition,
    capture: FrameCapture,
    upload_policy: UploadPolicy,
}

impl CaptureSession {
    pub fn new(
        id: SessionId,
        media: MediaAcquisition,
        capture: FrameCapture,
        upload_policy: UploadPolicy,
    ) -> Self {
        Self {
            id,
            state: ScanState::Idle,
            media,
            capture,
            upload_policy,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn camera_active(&self) -> bool {
        matches!(self.state, ScanState::CameraActive) && self.media.is_active()
    }

    pub fn processing(&self) -> bool {
        self.state.is_processing()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ScanState::Failed(failure) => Some(&failure.message),
            _ => None,
        }
    }

    /// Inline message for the no-match and failed states.
    pub fn status_message(&self) -> Option<&str> {
        match &self.state {
            ScanState::NoMatch { .. } => Some(NO_MATCH_MESSAGE),
            _ => self.error(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        match &self.state {
            ScanState::ResultFound { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn primary_candidate(&self) -> Option<&str> {
        self.candidates().first().map(String::as_str)
    }

    pub async fn start_camera(&mut self) -> Result<()> {
        match self.state {
            ScanState::Processing { .. } => return Err(self.invalid("start the camera")),
            ScanState::CameraActive if self.media.is_active() => return Ok(()),
            _ => {}
        }

        match self.media.start().await {
            Ok(()) => {
                self.state = ScanState::CameraActive;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{}: camera start failed: {}", self.id, e);
                self.state = ScanState::Failed(SessionFailure::from(&e));
                Err(e)
            }
        }
    }

    /// Idempotent.
    pub fn stop_camera(&mut self) {
        self.media.stop();
        if matches!(self.state, ScanState::CameraActive) {
            self.state = ScanState::Idle;
        }
    }

    /// Captures the current frame. The camera is stopped on success and on
    /// failure, before any recognition can start.
    pub fn capture(&mut self) -> Result<PendingRecognition> {
        if !matches!(self.state, ScanState::CameraActive) {
            return Err(self.invalid("capture a frame"));
        }

        let captured = match self.media.stream_mut() {
            Some(stream) => self.capture.capture(stream),
            None => Err(ScanError::CaptureFailed {
                reason: "camera stream is not active".to_string(),
            }),
        };
        self.media.stop();

        match captured {
            Ok(payload) => {
                self.state = ScanState::Processing {
                    source: PayloadSource::Camera,
                };
                Ok(PendingRecognition {
                    session: self.id,
                    payload,
                })
            }
            Err(e) => {
                tracing::warn!("{}: capture failed: {}", self.id, e);
                self.state = ScanState::Failed(SessionFailure::from(&e));
                Err(e)
            }
        }
    }

    pub fn submit_upload(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<PendingRecognition> {
        if self.processing() {
            return Err(self.invalid("upload an image"));
        }
        self.media.stop();

        match self.upload_policy.accept(file_name, bytes) {
            Ok(payload) => {
                self.state = ScanState::Processing {
                    source: payload.source().clone(),
                };
                Ok(PendingRecognition {
                    session: self.id,
                    payload,
                })
            }
            Err(e) => {
                tracing::warn!("{}: upload rejected: {}", self.id, e);
                self.state = ScanState::Failed(SessionFailure::from(&e));
                Err(e)
            }
        }
    }

    /// Applies a recognition outcome. Returns `false` when the outcome belongs
    /// to another session or the session is no longer processing.
    pub fn apply(&mut self, outcome: RecognitionOutcome) -> bool {
        if outcome.session != self.id || !self.processing() {
            return false;
        }

        self.state = match outcome.result {
            Ok(result) if result.is_no_match() => ScanState::NoMatch { text: result.text },
            Ok(result) => ScanState::ResultFound {
                text: result.text,
                candidates: result.candidates,
            },
            Err(e) => {
                tracing::warn!("{}: recognition failed: {}", self.id, e);
                ScanState::Failed(SessionFailure::from(&e))
            }
        };
        true
    }

    /// "Scan Again": clears the previous outcome and restarts the camera.
    pub async fn scan_again(&mut self) -> Result<()> {
        if !self.state.can_retry() && !matches!(self.state, ScanState::Idle) {
            return Err(self.invalid("scan again"));
        }
        self.state = ScanState::Idle;
        self.start_camera().await
    }

    fn invalid(&self, action: &'static str) -> ScanError {
        ScanError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
