//! Frame capture pipeline — live frame to base64 JPEG.

use crate::device::VideoStream;
use crate::frame::Frame;
use base64::Engine;
use facelink_core::{CapturedFrame, FrameEncoding};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

/// Fixed JPEG quality for transmitted frames (0.8 on the 0–1 scale).
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("video source not ready")]
    SourceNotReady,
    #[error("frame read failed: {0}")]
    ReadFailed(String),
    #[error("jpeg encoding failed: {0}")]
    Encode(String),
}

/// Capture the current frame of a ready video source.
///
/// Fails with [`CaptureError::SourceNotReady`] if the source has not
/// reported readiness; callers check readiness, the pipeline never
/// polls. The frame is read in true camera orientation — any mirroring
/// applied for preview must not reach this path.
pub fn capture_frame<S: VideoStream + ?Sized>(stream: &mut S) -> Result<CapturedFrame, CaptureError> {
    if !stream.frame_ready() {
        return Err(CaptureError::SourceNotReady);
    }
    let frame = stream.read_frame()?;
    encode_frame(&frame)
}

/// Serialize an RGB frame to a base64 JPEG at native dimensions.
pub fn encode_frame(frame: &Frame) -> Result<CapturedFrame, CaptureError> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder
        .write_image(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    tracing::debug!(
        width = frame.width,
        height = frame.height,
        jpeg_bytes = jpeg.len(),
        "frame encoded"
    );

    Ok(CapturedFrame {
        width: frame.width,
        height: frame.height,
        encoding: FrameEncoding::JpegBase64,
        payload: base64::engine::general_purpose::STANDARD.encode(&jpeg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    /// 16x16 asymmetric test pattern: left half red, right half black.
    fn test_pattern() -> Frame {
        let (w, h) = (16u32, 16u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _y in 0..h {
            for x in 0..w {
                if x < w / 2 {
                    data.extend_from_slice(&[220, 20, 20]);
                } else {
                    data.extend_from_slice(&[10, 10, 10]);
                }
            }
        }
        Frame {
            data,
            width: w,
            height: h,
        }
    }

    struct PatternStream {
        ready: bool,
    }

    impl VideoStream for PatternStream {
        fn width(&self) -> u32 {
            16
        }
        fn height(&self) -> u32 {
            16
        }
        fn frame_ready(&self) -> bool {
            self.ready
        }
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(test_pattern())
        }
        fn stop(&mut self) {}
    }

    fn decode(captured: &CapturedFrame) -> image::RgbImage {
        let jpeg = base64::engine::general_purpose::STANDARD
            .decode(&captured.payload)
            .unwrap();
        image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_capture_requires_ready_source() {
        let mut stream = PatternStream { ready: false };
        assert!(matches!(
            capture_frame(&mut stream),
            Err(CaptureError::SourceNotReady)
        ));
    }

    #[test]
    fn test_capture_keeps_native_dimensions() {
        let mut stream = PatternStream { ready: true };
        let captured = capture_frame(&mut stream).unwrap();
        assert_eq!((captured.width, captured.height), (16, 16));

        let decoded = decode(&captured);
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_capture_preserves_source_orientation() {
        // The encoded payload must match the unmirrored source: red on
        // the left, dark on the right, even though preview mirrors.
        let mut stream = PatternStream { ready: true };
        let decoded = decode(&capture_frame(&mut stream).unwrap());

        let left = decoded.get_pixel(2, 8);
        let right = decoded.get_pixel(13, 8);
        assert!(left[0] > 150, "left side should be red, got {left:?}");
        assert!(right[0] < 80, "right side should be dark, got {right:?}");
    }

    #[test]
    fn test_mirrored_frame_encodes_differently() {
        let frame = test_pattern();
        let straight = decode(&encode_frame(&frame).unwrap());
        let flipped = decode(&encode_frame(&frame.mirrored()).unwrap());

        assert!(straight.get_pixel(2, 8)[0] > 150);
        assert!(flipped.get_pixel(2, 8)[0] < 80);
    }
}
