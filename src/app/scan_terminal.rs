use crate::app::inventory::{InventoryCatalog, ALL_CATEGORIES};
use crate::core::acquisition::{MediaAcquisition, NullPreview};
use crate::core::capture::FrameCapture;
use crate::core::session::{
    CaptureSession, PendingRecognition, RecognitionOutcome, ScanState, SessionId,
};
use crate::core::upload::UploadPolicy;
use crate::domain::model::{InventoryItem, VideoConstraints};
use crate::domain::ports::{CameraDevice, PreviewSurface};
use crate::utils::error::{Result, ScanError};
use std::sync::Arc;

static IDLE: ScanState = ScanState::Idle;

type PreviewFactory = Box<dyn Fn() -> Box<dyn PreviewSurface> + Send + Sync>;

/// Inventory screen host: search field, category filter and the scan dialog.
///
/// At most one capture session exists, and only while the dialog is open.
pub struct ScanTerminal {
    camera: Arc<dyn CameraDevice>,
    preview_factory: PreviewFactory,
    constraints: VideoConstraints,
    frame_capture: FrameCapture,
    upload_policy: UploadPolicy,
    catalog: InventoryCatalog,
    search_query: String,
    selected_category: String,
    dialog: Option<CaptureSession>,
    next_session: u64,
}

impl ScanTerminal {
    pub fn new(camera: Arc<dyn CameraDevice>, catalog: InventoryCatalog) -> Self {
        Self {
            camera,
            preview_factory: Box::new(|| Box::new(NullPreview::default()) as Box<dyn PreviewSurface>),
            constraints: VideoConstraints::default(),
            frame_capture: FrameCapture::default(),
            upload_policy: UploadPolicy::default(),
            catalog,
            search_query: String::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            dialog: None,
            next_session: 1,
        }
    }

    pub fn with_preview<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PreviewSurface> + Send + Sync + 'static,
    {
        self.preview_factory = Box::new(factory);
        self
    }

    pub fn with_constraints(mut self, constraints: VideoConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_frame_capture(mut self, frame_capture: FrameCapture) -> Self {
        self.frame_capture = frame_capture;
        self
    }

    pub fn with_upload_policy(mut self, upload_policy: UploadPolicy) -> Self {
        self.upload_policy = upload_policy;
        self
    }

    // ---- 掃描對話框 ----

    /// Opens the dialog with a fresh Idle session. Reopening an open dialog
    /// keeps the current session.
    pub fn open_dialog(&mut self) -> SessionId {
        if let Some(session) = &self.dialog {
            return session.id();
        }

        let id = SessionId::new(self.next_session);
        self.next_session += 1;

        let media = MediaAcquisition::new(
            self.camera.clone(),
            (self.preview_factory)(),
            self.constraints.clone(),
        );
        self.dialog = Some(CaptureSession::new(
            id,
            media,
            self.frame_capture.clone(),
            self.upload_policy.clone(),
        ));
        tracing::debug!("Scan dialog opened ({})", id);
        id
    }

    /// Closes the dialog from any state. The session is dropped, which stops
    /// the camera; results still in flight for it will be discarded.
    pub fn close_dialog(&mut self) {
        if let Some(mut session) = self.dialog.take() {
            session.stop_camera();
            tracing::debug!(
                "Scan dialog closed ({}, state {})",
                session.id(),
                session.state().name()
            );
        }
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.dialog.as_ref()
    }

    /// Dialog state; `Idle` while the dialog is closed.
    pub fn state(&self) -> &ScanState {
        self.dialog
            .as_ref()
            .map(CaptureSession::state)
            .unwrap_or(&IDLE)
    }

    pub async fn start_camera(&mut self) -> Result<()> {
        self.session_mut("start the camera")?.start_camera().await
    }

    pub fn stop_camera(&mut self) {
        if let Some(session) = self.dialog.as_mut() {
            session.stop_camera();
        }
    }

    pub fn capture(&mut self) -> Result<PendingRecognition> {
        self.session_mut("capture a frame")?.capture()
    }

    pub fn upload_image(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<PendingRecognition> {
        self.session_mut("upload an image")?
            .submit_upload(file_name, bytes)
    }

    /// Applies a finished recognition if its session is still the open one.
    /// Stale outcomes are dropped and logged.
    pub fn apply_recognition(&mut self, outcome: RecognitionOutcome) -> bool {
        let outcome_session = outcome.session();
        let current = self.dialog.as_ref().map(CaptureSession::id);
        if current != Some(outcome_session) {
            tracing::warn!(
                "Discarding stale recognition result for {} (dialog session: {:?})",
                outcome_session,
                current
            );
            return false;
        }

        match self.dialog.as_mut() {
            Some(session) => session.apply(outcome),
            None => false,
        }
    }

    pub async fn scan_again(&mut self) -> Result<()> {
        self.session_mut("scan again")?.scan_again().await
    }

    /// "Use This": writes the primary candidate into the search field and
    /// closes the dialog.
    pub fn use_candidate(&mut self) -> Result<String> {
        let candidate = match self.dialog.as_ref() {
            Some(session) => session
                .primary_candidate()
                .map(str::to_string)
                .ok_or_else(|| ScanError::InvalidTransition {
                    action: "use a candidate",
                    state: session.state().name(),
                })?,
            None => {
                return Err(ScanError::InvalidTransition {
                    action: "use a candidate",
                    state: "closed",
                })
            }
        };

        tracing::info!("✅ Using scanned serial number {}", candidate);
        self.search_query = candidate.clone();
        self.close_dialog();
        Ok(candidate)
    }

    fn session_mut(&mut self, action: &'static str) -> Result<&mut CaptureSession> {
        self.dialog
            .as_mut()
            .ok_or(ScanError::InvalidTransition {
                action,
                state: "closed",
            })
    }

    // ---- 搜尋與篩選 ----

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        self.selected_category = category.into();
    }

    pub fn catalog(&self) -> &InventoryCatalog {
        &self.catalog
    }

    pub fn filtered_items(&self) -> Vec<&InventoryItem> {
        self.catalog
            .filter(&self.search_query, &self.selected_category)
    }
}
