use crate::domain::model::{Frame, FrameFormat, ImagePayload};
use crate::domain::ports::VideoStream;
use crate::utils::error::{Result, ScanError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};

pub const FALLBACK_WIDTH: u32 = 1280;
pub const FALLBACK_HEIGHT: u32 = 720;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone)]
pub struct FrameCapture {
    fallback: (u32, u32),
    jpeg_quality: u8,
}

impl FrameCapture {
    pub fn new(fallback: (u32, u32), jpeg_quality: u8) -> Self {
        Self {
            fallback,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Snapshots the current frame and encodes it as JPEG.
    ///
    /// The raster target takes the stream's displayed size, or the fallback
    /// size when the stream does not report one. Frames of a different size
    /// are scaled into the target.
    pub fn capture(&self, stream: &mut dyn VideoStream) -> Result<ImagePayload> {
        let (width, height) = stream
            .dimensions()
            .filter(|&(w, h)| w > 0 && h > 0)
            .unwrap_or(self.fallback);

        let frame = stream.grab_frame().ok_or_else(|| ScanError::CaptureFailed {
            reason: "no frame available from video stream".to_string(),
        })?;

        let raster = draw_frame(frame, width, height)?;

        let mut jpeg_buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg_buf, self.jpeg_quality);
            encoder
                .encode_image(&raster)
                .map_err(|e| ScanError::CaptureFailed {
                    reason: format!("JPEG encoding failed: {}", e),
                })?;
        }

        if jpeg_buf.is_empty() {
            return Err(ScanError::CaptureFailed {
                reason: "encoder produced no data".to_string(),
            });
        }

        tracing::debug!(
            "Captured {}x{} frame ({} bytes JPEG, quality {})",
            width,
            height,
            jpeg_buf.len(),
            self.jpeg_quality
        );

        Ok(ImagePayload::from_capture(jpeg_buf))
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new((FALLBACK_WIDTH, FALLBACK_HEIGHT), DEFAULT_JPEG_QUALITY)
    }
}

fn draw_frame(frame: Frame, width: u32, height: u32) -> Result<RgbImage> {
    let expected = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|pixels| pixels.checked_mul(frame.format.bytes_per_pixel()))
        .ok_or_else(|| ScanError::CaptureFailed {
            reason: format!(
                "frame size {}x{} is out of range",
                frame.width, frame.height
            ),
        })?;
    if frame.width == 0 || frame.height == 0 || frame.data.len() < expected {
        return Err(ScanError::CaptureFailed {
            reason: format!(
                "frame buffer of {} bytes does not hold a {}x{} {:?} image",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format
            ),
        });
    }

    let mut data = frame.data;
    data.truncate(expected);

    let rgb = match frame.format {
        FrameFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, data),
        FrameFormat::Rgba8 => RgbaImage::from_raw(frame.width, frame.height, data)
            .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8()),
    }
    .ok_or_else(|| ScanError::CaptureFailed {
        reason: "drawing target unavailable".to_string(),
    })?;

    if rgb.dimensions() == (width, height) {
        Ok(rgb)
    } else {
        Ok(image::imageops::resize(&rgb, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticStream {
        dims: Option<(u32, u32)>,
        frame: Option<Frame>,
    }

    impl VideoStream for StaticStream {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            self.dims
        }

        fn grab_frame(&mut self) -> Option<Frame> {
            self.frame.clone()
        }

        fn stop_tracks(&mut self) {}

        fn is_live(&self) -> bool {
            true
        }
    }

    fn solid_frame(width: u32, height: u32, format: FrameFormat) -> Frame {
        Frame {
            data: vec![200; (width * height) as usize * format.bytes_per_pixel()],
            width,
            height,
            format,
        }
    }

    fn decoded_dimensions(payload: &ImagePayload) -> (u32, u32) {
        let img = image::load_from_memory(payload.bytes()).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_capture_encodes_jpeg_at_stream_size() {
        let mut stream = StaticStream {
            dims: Some((64, 32)),
            frame: Some(solid_frame(64, 32, FrameFormat::Rgb8)),
        };
        let payload = FrameCapture::default().capture(&mut stream).unwrap();

        assert!(!payload.is_empty());
        assert_eq!(&payload.bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(decoded_dimensions(&payload), (64, 32));
    }

    #[test]
    fn test_capture_uses_fallback_size_when_unknown() {
        let mut stream = StaticStream {
            dims: None,
            frame: Some(solid_frame(16, 9, FrameFormat::Rgba8)),
        };
        let capture = FrameCapture::new((32, 18), 90);
        let payload = capture.capture(&mut stream).unwrap();

        assert_eq!(decoded_dimensions(&payload), (32, 18));
    }

    #[test]
    fn test_capture_without_frame_fails() {
        let mut stream = StaticStream {
            dims: Some((64, 32)),
            frame: None,
        };
        let err = FrameCapture::default().capture(&mut stream).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailed { .. }));
    }

    #[test]
    fn test_truncated_frame_fails() {
        let mut frame = solid_frame(8, 8, FrameFormat::Rgb8);
        frame.data.truncate(10);
        let mut stream = StaticStream {
            dims: Some((8, 8)),
            frame: Some(frame),
        };
        let err = FrameCapture::default().capture(&mut stream).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailed { .. }));
    }

    #[test]
    fn test_oversized_frame_header_fails() {
        let mut stream = StaticStream {
            dims: Some((8, 8)),
            frame: Some(Frame {
                data: vec![0; 16],
                width: u32::MAX,
                height: u32::MAX,
                format: FrameFormat::Rgba8,
            }),
        };
        let err = FrameCapture::default().capture(&mut stream).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailed { .. }));
        assert!(err.to_string().contains("out of range"));
    }
}
