use crate::domain::model::VideoConstraints;
use crate::domain::ports::{CameraDevice, PreviewSurface, VideoStream};
use crate::utils::error::{Result, ScanError};
use std::sync::Arc;

/// Owns a live stream and stops its tracks when dropped.
pub struct CameraGuard {
    stream: Box<dyn VideoStream>,
}

impl CameraGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &dyn VideoStream {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> &mut dyn VideoStream {
        self.stream.as_mut()
    }

    /// Explicit release; same effect as dropping the guard.
    pub fn release(self) {}
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        if self.stream.is_live() {
            tracing::debug!("Stopping camera tracks");
        }
        self.stream.stop_tracks();
    }
}

/// Preview surface for headless use.
#[derive(Debug, Default)]
pub struct NullPreview;

impl PreviewSurface for NullPreview {
    fn attach(&mut self, _dimensions: Option<(u32, u32)>) {}

    fn detach(&mut self) {}
}

/// 相機串流的取得與釋放；同一時間最多一個串流
pub struct MediaAcquisition {
    camera: Arc<dyn CameraDevice>,
    preview: Box<dyn PreviewSurface>,
    constraints: VideoConstraints,
    active: Option<CameraGuard>,
}

impl MediaAcquisition {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        preview: Box<dyn PreviewSurface>,
        constraints: VideoConstraints,
    ) -> Self {
        Self {
            camera,
            preview,
            constraints,
            active: None,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        // 先釋放舊串流再取得新的
        self.stop();

        tracing::debug!(
            "Requesting camera stream (facing: {:?}, ideal: {}x{})",
            self.constraints.facing_mode,
            self.constraints.ideal_width,
            self.constraints.ideal_height
        );

        let stream = self
            .camera
            .request_video_stream(&self.constraints)
            .await
            .map_err(into_camera_access)?;

        let mut guard = CameraGuard::new(stream);
        // play 失敗時 guard 被 drop，串流隨之釋放
        guard.stream_mut().play().map_err(into_camera_access)?;

        self.preview.attach(guard.stream().dimensions());
        self.active = Some(guard);
        tracing::info!("📷 Camera started");
        Ok(())
    }

    /// Idempotent; safe to call without an active stream.
    pub fn stop(&mut self) {
        if let Some(guard) = self.active.take() {
            guard.release();
            tracing::info!("📷 Camera stopped");
        }
        self.preview.detach();
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .map(|guard| guard.stream().is_live())
            .unwrap_or(false)
    }

    pub fn stream_mut(&mut self) -> Option<&mut dyn VideoStream> {
        self.active.as_mut().map(CameraGuard::stream_mut)
    }
}

impl Drop for MediaAcquisition {
    fn drop(&mut self) {
        self.stop();
    }
}

fn into_camera_access(err: ScanError) -> ScanError {
    match err {
        ScanError::CameraAccess { .. } => err,
        other => ScanError::CameraAccess {
            reason: other.to_string(),
        },
    }
}
