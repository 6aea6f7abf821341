//! V4L2 capture backend via the `v4l` crate.

use crate::capture::CaptureError;
use crate::device::{DeviceError, Facing, MediaDevice, StreamConstraints, VideoStream};
use crate::frame::{self, Frame};
use std::path::Path;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Info about a discovered V4L2 capture device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
}

/// Negotiated pixel format for the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel).
    Yuyv,
    /// Motion-JPEG, one JPEG image per frame.
    Mjpg,
    /// Packed 24-bit RGB, driver-native.
    Rgb3,
}

/// A V4L2 capture device, identified by its `/dev/videoN` path.
pub struct V4lDevice {
    device_path: String,
    /// Frames discarded after open so auto-exposure settles.
    warmup_frames: usize,
}

impl V4lDevice {
    pub fn new(device_path: impl Into<String>, warmup_frames: usize) -> Self {
        Self {
            device_path: device_path.into(),
            warmup_frames,
        }
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
            });
        }

        devices
    }
}

fn open_error(device_path: &str, e: std::io::Error) -> DeviceError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            DeviceError::PermissionDenied(format!("{device_path}: {e}"))
        }
        _ => DeviceError::DeviceUnavailable(format!("{device_path}: {e}")),
    }
}

impl MediaDevice for V4lDevice {
    type Stream = V4lStream;

    fn acquire(&self, constraints: &StreamConstraints) -> Result<V4lStream, DeviceError> {
        if constraints.facing == Facing::Environment {
            tracing::debug!("facing=environment is advisory on V4L2; using configured device");
        }
        if !Path::new(&self.device_path).exists() {
            return Err(DeviceError::DeviceUnavailable(format!(
                "{}: no such device",
                self.device_path
            )));
        }

        let device =
            Device::with_path(&self.device_path).map_err(|e| open_error(&self.device_path, e))?;

        let caps = device
            .query_caps()
            .map_err(|e| DeviceError::DeviceUnavailable(format!("query caps failed: {e}")))?;
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(DeviceError::ConstraintUnsatisfiable(format!(
                "{} does not support video capture",
                self.device_path
            )));
        }

        // Request YUYV at the ideal resolution; accept whatever the
        // driver negotiates as long as we can decode it.
        let mut fmt = device
            .format()
            .map_err(|e| DeviceError::ConstraintUnsatisfiable(format!("get format failed: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = constraints.ideal_width;
        fmt.height = constraints.ideal_height;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| DeviceError::ConstraintUnsatisfiable(format!("set format failed: {e}")))?;

        let pixel_format = if negotiated.fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if negotiated.fourcc == FourCC::new(b"MJPG") {
            PixelFormat::Mjpg
        } else if negotiated.fourcc == FourCC::new(b"RGB3") {
            PixelFormat::Rgb3
        } else {
            return Err(DeviceError::ConstraintUnsatisfiable(format!(
                "unsupported pixel format {:?} (need YUYV, MJPG, or RGB3)",
                negotiated.fourcc
            )));
        };

        tracing::info!(
            device = %self.device_path,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?negotiated.fourcc,
            "camera stream opened"
        );

        let mut stream = V4lStream {
            device,
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
            ready: false,
        };

        // Discard warmup frames so auto-exposure settles; the first
        // successful read is what flips the source to frame-ready.
        for _ in 0..self.warmup_frames.max(1) {
            stream
                .dequeue_rgb()
                .map_err(|e| DeviceError::DeviceUnavailable(format!("warmup read: {e}")))?;
        }
        stream.ready = true;

        Ok(stream)
    }
}

/// An open V4L2 stream delivering RGB frames.
pub struct V4lStream {
    device: Device,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    ready: bool,
}

impl V4lStream {
    fn dequeue_rgb(&mut self) -> Result<Frame, CaptureError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CaptureError::ReadFailed(format!("mmap stream: {e}")))?;
        let (buf, _meta) = stream
            .next()
            .map_err(|e| CaptureError::ReadFailed(format!("dequeue buffer: {e}")))?;

        match self.pixel_format {
            PixelFormat::Yuyv => {
                let data = frame::yuyv_to_rgb(buf, self.width, self.height)
                    .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;
                Ok(Frame {
                    data,
                    width: self.width,
                    height: self.height,
                })
            }
            PixelFormat::Mjpg => {
                let decoded = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
                    .map_err(|e| CaptureError::ReadFailed(format!("mjpg decode: {e}")))?
                    .to_rgb8();
                Ok(Frame {
                    width: decoded.width(),
                    height: decoded.height(),
                    data: decoded.into_raw(),
                })
            }
            PixelFormat::Rgb3 => {
                let expected = (self.width * self.height * 3) as usize;
                if buf.len() < expected {
                    return Err(CaptureError::ReadFailed(format!(
                        "RGB3 buffer too short: expected {expected}, got {}",
                        buf.len()
                    )));
                }
                Ok(Frame {
                    data: buf[..expected].to_vec(),
                    width: self.width,
                    height: self.height,
                })
            }
        }
    }
}

impl VideoStream for V4lStream {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_ready(&self) -> bool {
        self.ready
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.ready {
            return Err(CaptureError::SourceNotReady);
        }
        self.dequeue_rgb()
    }

    fn stop(&mut self) {
        // Dropping the last stream handle turns the OS camera indicator
        // off; marking not-ready keeps late readers honest.
        self.ready = false;
    }
}
