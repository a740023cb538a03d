use crate::domain::model::{Frame, VideoConstraints};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Device able to hand out live video streams.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Fails with `ScanError::CameraAccess` on permission denial or missing device.
    async fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>>;
}

/// A live stream. Only ever owned by one `CameraGuard`.
pub trait VideoStream: Send {
    fn play(&mut self) -> Result<()>;

    /// Current displayed dimensions, `None` until the stream reports them.
    fn dimensions(&self) -> Option<(u32, u32)>;

    fn grab_frame(&mut self) -> Option<Frame>;

    /// Stops every track. Calling twice is a no-op.
    fn stop_tracks(&mut self);

    fn is_live(&self) -> bool;
}

pub trait PreviewSurface: Send {
    fn attach(&mut self, dimensions: Option<(u32, u32)>);
    fn detach(&mut self);
}

/// Text recognition engine, treated as a black box.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}
