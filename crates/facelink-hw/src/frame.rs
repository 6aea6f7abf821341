//! Frame type and pixel conversion — YUYV to RGB, preview mirroring.

use thiserror::Error;

/// A decoded RGB8 camera frame, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Horizontally flipped copy for selfie-style preview.
    ///
    /// Display-only: the capture pipeline always reads the true camera
    /// orientation, never a mirrored frame.
    pub fn mirrored(&self) -> Frame {
        let w = self.width as usize;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(w * 3) {
            for x in (0..w).rev() {
                data.extend_from_slice(&row[x * 3..x * 3 + 3]);
            }
        }
        Frame {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Convert packed YUYV (4:2:2) to RGB8 using BT.601 coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share
/// the U/V pair. Width must be even, which V4L2 guarantees for YUYV.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for quad in yuyv[..expected].chunks_exact(4) {
        let [y0, u, y1, v] = [quad[0], quad[1], quad[2], quad[3]];
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }
    Ok(rgb)
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;

    [
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width + x) * 3) as usize;
        [frame.data[i], frame.data[i + 1], frame.data[i + 2]]
    }

    #[test]
    fn test_yuyv_neutral_chroma_is_grayscale() {
        // 2x1: Y0=0, Y1=255, U=V=128 → pure black and pure white
        let rgb = yuyv_to_rgb(&[0, 128, 255, 128], 2, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_red_chroma() {
        // High V pushes red up and green down
        let rgb = yuyv_to_rgb(&[128, 128, 128, 255], 2, 1).unwrap();
        assert!(rgb[0] > 200, "red channel should saturate, got {}", rgb[0]);
        assert!(rgb[1] < 128, "green channel should drop, got {}", rgb[1]);
    }

    #[test]
    fn test_yuyv_invalid_length() {
        let result = yuyv_to_rgb(&[0, 128], 2, 1);
        assert!(matches!(
            result,
            Err(FrameError::InvalidLength {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_mirrored_flips_rows_only() {
        // 3x2 frame with a distinct pixel per cell
        let data: Vec<u8> = (0..18).collect();
        let frame = Frame {
            data,
            width: 3,
            height: 2,
        };
        let mirrored = frame.mirrored();

        assert_eq!(px(&mirrored, 0, 0), px(&frame, 2, 0));
        assert_eq!(px(&mirrored, 2, 0), px(&frame, 0, 0));
        assert_eq!(px(&mirrored, 1, 1), px(&frame, 1, 1));
        // Rows stay in place
        assert_eq!(px(&mirrored, 0, 1), px(&frame, 2, 1));
    }

    #[test]
    fn test_mirror_is_involutive() {
        let frame = Frame {
            data: (0..24).collect(),
            width: 4,
            height: 2,
        };
        assert_eq!(frame.mirrored().mirrored(), frame);
    }
}
