//! facelink-session — Controllers binding device, capture, and gateway.
//!
//! `PersonRegistryController` reconciles the local person list with the
//! remote registry; `WebcamRecognitionController` drives the
//! idle → live → capturing → result state machine over a camera stream.

pub mod registry;
pub mod webcam;

pub use registry::{PersonRegistryController, RegistryError};
pub use webcam::{WebcamError, WebcamRecognitionController};
