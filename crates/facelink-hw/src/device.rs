//! Device seams and the scoped media session.
//!
//! `MediaDevice` abstracts "something that can hand out a video stream"
//! so the controllers can run against a real V4L2 camera or a synthetic
//! source in tests. `MediaDeviceSession` owns at most one active stream
//! and guarantees release on every exit path, including drop.

use crate::capture::CaptureError;
use crate::frame::Frame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("requested constraints unsatisfiable: {0}")]
    ConstraintUnsatisfiable(String),
}

/// Which way the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

/// Preferred stream parameters. Resolutions are ideals, not demands:
/// the driver may negotiate something else.
#[derive(Debug, Clone)]
pub struct StreamConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Advisory on V4L2 — single-camera hosts have nothing to select.
    pub facing: Facing,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            ideal_height: 480,
            facing: Facing::User,
        }
    }
}

/// An open, video-only stream.
pub trait VideoStream {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// True once the source has negotiated a format and delivered at
    /// least one frame. Callers must check this before capturing; the
    /// pipeline does not poll.
    fn frame_ready(&self) -> bool;

    /// Read the current frame in true camera orientation.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Stop all tracks. The stream delivers nothing afterwards.
    fn stop(&mut self);
}

/// A capture device that can open a stream against constraints.
pub trait MediaDevice {
    type Stream: VideoStream;

    fn acquire(&self, constraints: &StreamConstraints) -> Result<Self::Stream, DeviceError>;
}

/// Holds the one active stream of a capture device.
///
/// `release` is idempotent and also runs on drop, so a session can never
/// leak an open stream past its owner.
pub struct MediaDeviceSession<D: MediaDevice> {
    device: D,
    stream: Option<D::Stream>,
}

impl<D: MediaDevice> MediaDeviceSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            stream: None,
        }
    }

    /// Open a stream against the device.
    ///
    /// Any previously held stream is stopped first, keeping the
    /// one-active-stream invariant even across repeated acquires. On
    /// failure no stream is retained.
    pub fn acquire(&mut self, constraints: &StreamConstraints) -> Result<(), DeviceError> {
        self.release();
        let stream = self.device.acquire(constraints)?;
        tracing::debug!(
            width = stream.width(),
            height = stream.height(),
            "media stream acquired"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop every track of the held stream and clear the handle.
    /// Calling with no active stream is a no-op.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("media stream released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream(&self) -> Option<&D::Stream> {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> Option<&mut D::Stream> {
        self.stream.as_mut()
    }
}

impl<D: MediaDevice> Drop for MediaDeviceSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeStream {
        stopped: Arc<AtomicUsize>,
    }

    impl VideoStream for FakeStream {
        fn width(&self) -> u32 {
            640
        }
        fn height(&self) -> u32 {
            480
        }
        fn frame_ready(&self) -> bool {
            true
        }
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame {
                data: vec![0; 640 * 480 * 3],
                width: 640,
                height: 480,
            })
        }
        fn stop(&mut self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeDevice {
        stops: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MediaDevice for FakeDevice {
        type Stream = FakeStream;

        fn acquire(&self, _constraints: &StreamConstraints) -> Result<FakeStream, DeviceError> {
            if self.fail {
                return Err(DeviceError::DeviceUnavailable("no such device".into()));
            }
            Ok(FakeStream {
                stopped: self.stops.clone(),
            })
        }
    }

    fn session(fail: bool) -> (MediaDeviceSession<FakeDevice>, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        (
            MediaDeviceSession::new(FakeDevice {
                stops: stops.clone(),
                fail,
            }),
            stops,
        )
    }

    #[test]
    fn test_acquire_holds_one_stream() {
        let (mut session, stops) = session(false);
        session.acquire(&StreamConstraints::default()).unwrap();
        assert!(session.is_active());

        // Re-acquire stops the first stream before opening the second
        session.acquire(&StreamConstraints::default()).unwrap();
        assert!(session.is_active());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut session, stops) = session(false);
        session.acquire(&StreamConstraints::default()).unwrap();

        session.release();
        session.release();
        assert!(!session.is_active());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_acquire_retains_nothing() {
        let (mut session, _) = session(true);
        assert!(session.acquire(&StreamConstraints::default()).is_err());
        assert!(!session.is_active());
        assert!(session.stream().is_none());
    }

    #[test]
    fn test_drop_releases_stream() {
        let (mut session, stops) = session(false);
        session.acquire(&StreamConstraints::default()).unwrap();
        drop(session);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
