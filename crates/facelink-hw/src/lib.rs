//! facelink-hw — Hardware abstraction for camera capture.
//!
//! Provides the `MediaDevice`/`VideoStream` seams, the scoped
//! `MediaDeviceSession` stream holder, a V4L2 backend, and the frame
//! capture pipeline that turns a live frame into a base64 JPEG.

pub mod capture;
pub mod device;
pub mod frame;
pub mod v4l2;

pub use capture::{capture_frame, encode_frame, CaptureError};
pub use device::{
    DeviceError, Facing, MediaDevice, MediaDeviceSession, StreamConstraints, VideoStream,
};
pub use frame::Frame;
pub use v4l2::{DeviceInfo, V4lDevice};
