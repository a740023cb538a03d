use crate::domain::model::{Frame, FrameFormat, VideoConstraints};
use crate::domain::ports::{CameraDevice, VideoStream};
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use image::RgbImage;
use std::path::PathBuf;

/// Camera backed by a still image on disk. Every frame is that image.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    async fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ScanError::CameraAccess {
                reason: format!("no video source at {}: {}", self.path.display(), e),
            })?;

        let image = image::load_from_memory(&bytes).map_err(|e| ScanError::CameraAccess {
            reason: format!("cannot decode {}: {}", self.path.display(), e),
        })?;

        tracing::debug!(
            "Still image source {} ({}x{}), requested facing {:?}",
            self.path.display(),
            image.width(),
            image.height(),
            constraints.facing_mode
        );

        Ok(Box::new(StillImageStream {
            frame: image.to_rgb8(),
            playing: false,
            live: true,
        }))
    }
}

struct StillImageStream {
    frame: RgbImage,
    playing: bool,
    live: bool,
}

impl VideoStream for StillImageStream {
    fn play(&mut self) -> Result<()> {
        if !self.live {
            return Err(ScanError::CameraAccess {
                reason: "stream already stopped".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        if self.playing {
            Some(self.frame.dimensions())
        } else {
            None
        }
    }

    fn grab_frame(&mut self) -> Option<Frame> {
        if !self.live || !self.playing {
            return None;
        }
        let (width, height) = self.frame.dimensions();
        Some(Frame {
            data: self.frame.as_raw().clone(),
            width,
            height,
            format: FrameFormat::Rgb8,
        })
    }

    fn stop_tracks(&mut self) {
        self.live = false;
        self.playing = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stream_serves_image_frames() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("label.png");
        RgbImage::from_pixel(20, 10, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let camera = StillImageCamera::new(&path);
        let mut stream = camera
            .request_video_stream(&VideoConstraints::default())
            .await
            .unwrap();

        assert_eq!(stream.dimensions(), None);
        stream.play().unwrap();
        assert_eq!(stream.dimensions(), Some((20, 10)));

        let frame = stream.grab_frame().unwrap();
        assert_eq!(frame.data.len(), 20 * 10 * 3);

        stream.stop_tracks();
        stream.stop_tracks();
        assert!(!stream.is_live());
        assert!(stream.grab_frame().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_camera_access_error() {
        let camera = StillImageCamera::new("/definitely/not/here.png");
        let err = camera
            .request_video_stream(&VideoConstraints::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ScanError::CameraAccess { .. }));
    }
}
