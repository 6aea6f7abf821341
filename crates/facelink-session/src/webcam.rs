//! Webcam recognition controller — the idle → live → capturing state machine.
//!
//! One tagged state replaces the active/loading/result flag soup:
//! "capturing while the device is not live" is unrepresentable. State
//! lives behind a synchronous mutex that is never held across an await,
//! so `stop()` always runs immediately, even with a recognition request
//! hung in flight.

use facelink_core::{CaptureResult, RecognitionOutcome, SessionState};
use facelink_gateway::{GatewayError, RecognitionApi};
use facelink_hw::{
    capture_frame, CaptureError, DeviceError, MediaDevice, MediaDeviceSession, StreamConstraints,
};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebcamError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("recognition request failed: {0}")]
    Transport(String),
}

struct Inner<D: MediaDevice> {
    session: MediaDeviceSession<D>,
    state: SessionState,
    /// Bumped on every stop; a recognition reply whose epoch no longer
    /// matches is stale and gets discarded.
    epoch: u64,
    last_result: Option<CaptureResult>,
}

pub struct WebcamRecognitionController<D: MediaDevice, G: RecognitionApi> {
    gateway: G,
    constraints: StreamConstraints,
    inner: Mutex<Inner<D>>,
}

impl<D: MediaDevice, G: RecognitionApi> WebcamRecognitionController<D, G> {
    pub fn new(device: D, gateway: G, constraints: StreamConstraints) -> Self {
        Self {
            gateway,
            constraints,
            inner: Mutex::new(Inner {
                session: MediaDeviceSession::new(device),
                state: SessionState::Idle,
                epoch: 0,
                last_result: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().expect("webcam state lock poisoned").state
    }

    /// The outcome or failure attached by the most recent capture, if
    /// the session is still live.
    pub fn last_result(&self) -> Option<CaptureResult> {
        self.inner
            .lock()
            .expect("webcam state lock poisoned")
            .last_result
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .lock()
            .expect("webcam state lock poisoned")
            .session
            .is_active()
    }

    /// Acquire the camera and go live.
    ///
    /// Only meaningful from `Idle`; a start while already live is a
    /// no-op. On acquisition failure the controller returns to `Idle`
    /// with no partial resource retained.
    pub fn start(&self) -> Result<(), WebcamError> {
        let mut inner = self.inner.lock().expect("webcam state lock poisoned");
        if inner.state != SessionState::Idle {
            tracing::debug!(state = ?inner.state, "start ignored: session already active");
            return Ok(());
        }

        inner.state = SessionState::Acquiring;
        match inner.session.acquire(&self.constraints) {
            Ok(()) => {
                inner.state = SessionState::Live;
                inner.last_result = None;
                tracing::info!("webcam session live");
                Ok(())
            }
            Err(e) => {
                inner.state = SessionState::Idle;
                tracing::warn!(error = %e, "webcam acquisition failed");
                Err(e.into())
            }
        }
    }

    /// Capture the current frame and ask the service who it is.
    ///
    /// Permitted only from `Live`; any other state (including an
    /// in-flight capture) is a no-op returning `None`, so recognitions
    /// never overlap. On completion the session is `Live` again with
    /// the outcome or failure attached as the latest result — unless
    /// the session was stopped meanwhile, in which case the stale reply
    /// is discarded.
    pub async fn capture(&self) -> Result<Option<RecognitionOutcome>, WebcamError> {
        let (frame, epoch) = {
            let mut inner = self.inner.lock().expect("webcam state lock poisoned");
            if inner.state != SessionState::Live {
                tracing::debug!(state = ?inner.state, "capture ignored: session not live");
                return Ok(None);
            }

            // A pipeline failure never leaves Live: the request was
            // never issued, so there is nothing to attach.
            let epoch = inner.epoch;
            let stream = inner
                .session
                .stream_mut()
                .ok_or(CaptureError::SourceNotReady)?;
            let frame = capture_frame(stream)?;
            inner.state = SessionState::Capturing;
            (frame, epoch)
        };

        // Lock released: a hung request cannot block stop().
        let outcome = self.gateway.recognize(&frame).await;

        let mut inner = self.inner.lock().expect("webcam state lock poisoned");
        if inner.epoch != epoch || inner.state != SessionState::Capturing {
            tracing::debug!("discarding stale recognition result");
            return Ok(None);
        }

        inner.state = SessionState::Live;
        match outcome {
            Ok(outcome) => {
                tracing::info!(matched = outcome.matched_name.is_some(), "recognition result");
                inner.last_result = Some(CaptureResult::Outcome(outcome.clone()));
                Ok(Some(outcome))
            }
            Err(e) => {
                let message = match &e {
                    GatewayError::Transport(m) => m.clone(),
                    other => other.to_string(),
                };
                tracing::warn!(error = %message, "recognition request failed");
                inner.last_result = Some(CaptureResult::Failed(message.clone()));
                Err(WebcamError::Transport(message))
            }
        }
    }

    /// Release the device and return to `Idle`, clearing any attached
    /// result. A no-op when already idle. An in-flight recognition is
    /// left to complete; its reply will be recognized as stale.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().expect("webcam state lock poisoned");
        if inner.state == SessionState::Idle {
            return;
        }
        inner.session.release();
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.state = SessionState::Idle;
        inner.last_result = None;
        tracing::info!("webcam session stopped");
    }
}
