//! facelink-core — Domain types for the face-recognition client.
//!
//! Everything the controllers and the gateway exchange lives here:
//! enrolled persons, enrollment requests with their pre-flight
//! validation rules, captured frames, and recognition outcomes.

pub mod types;

pub use types::{
    CaptureResult, CapturedFrame, EnrollmentImage, EnrollmentRequest, FrameEncoding, Person,
    RecognitionOutcome, RegistrationAck, SessionState, ValidationError, MAX_ENROLLMENT_IMAGES,
    MIN_ENROLLMENT_IMAGES,
};
