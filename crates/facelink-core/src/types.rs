use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of reference images required to enroll a person.
pub const MIN_ENROLLMENT_IMAGES: usize = 2;
/// Maximum number of reference images accepted for one person.
pub const MAX_ENROLLMENT_IMAGES: usize = 4;

/// A person enrolled on the remote recognition service.
///
/// The image count is a server-reported fact, never computed locally
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub enrollment_image_count: u32,
}

/// One reference image attached to an enrollment request.
#[derive(Debug, Clone)]
pub struct EnrollmentImage {
    /// File name sent as the multipart part name (e.g., "front.jpg").
    pub file_name: String,
    /// MIME type of the image bytes (e.g., "image/jpeg").
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Validated enrollment request: trimmed non-empty name plus 2–4 images.
///
/// Construction is the only validation point; a value of this type is
/// always safe to hand to the gateway. The request is transient and is
/// never persisted.
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    name: String,
    images: Vec<EnrollmentImage>,
}

impl EnrollmentRequest {
    /// Validate and build an enrollment request.
    ///
    /// The name is trimmed; an empty result or an image count outside
    /// [`MIN_ENROLLMENT_IMAGES`]..=[`MAX_ENROLLMENT_IMAGES`] fails
    /// locally without any network involvement.
    pub fn new(name: &str, images: Vec<EnrollmentImage>) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(MIN_ENROLLMENT_IMAGES..=MAX_ENROLLMENT_IMAGES).contains(&images.len()) {
            return Err(ValidationError::ImageCount(images.len()));
        }
        Ok(Self {
            name: name.to_string(),
            images,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn images(&self) -> &[EnrollmentImage] {
        &self.images
    }
}

/// Local pre-flight validation failure. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("person name must not be empty")]
    EmptyName,
    #[error(
        "enrollment requires {MIN_ENROLLMENT_IMAGES} to {MAX_ENROLLMENT_IMAGES} images, got {0}"
    )]
    ImageCount(usize),
    #[error("another operation is already in progress for '{0}'")]
    OperationInFlight(String),
}

/// Payload encoding of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoding {
    JpegBase64,
}

impl std::fmt::Display for FrameEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameEncoding::JpegBase64 => write!(f, "jpeg-base64"),
        }
    }
}

/// A still image produced from a live video frame, ready for transmission.
///
/// Owned by the call that produced it and discarded once the recognition
/// request resolves.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub encoding: FrameEncoding,
    /// Base64-encoded JPEG bytes, without the data-URL prefix.
    pub payload: String,
}

impl CapturedFrame {
    /// Render the frame as the `data:` URL the recognition endpoint expects.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.payload)
    }
}

/// Result of one recognition request.
///
/// An absent `matched_name` means "no match found", which is distinct
/// from a transport failure (the latter never produces an outcome).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionOutcome {
    pub matched_name: Option<String>,
    pub confidence_percent: Option<f64>,
    pub message: String,
}

/// Server acknowledgement for a successful enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAck {
    pub message: String,
}

/// Webcam session state, owned exclusively by the webcam controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Acquiring,
    Live,
    Capturing,
}

/// The latest result attached to a live webcam session.
///
/// `Outcome` carries the service's answer (including "no match");
/// `Failed` records a device or transport failure as display text.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureResult {
    Outcome(RecognitionOutcome),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: usize) -> Vec<EnrollmentImage> {
        (0..n)
            .map(|i| EnrollmentImage {
                file_name: format!("ref{i}.jpg"),
                content_type: "image/jpeg".to_string(),
                bytes: vec![0xff, 0xd8, 0xff],
            })
            .collect()
    }

    #[test]
    fn test_enrollment_trims_name() {
        let request = EnrollmentRequest::new("  Ada Lovelace  ", image(2)).unwrap();
        assert_eq!(request.name(), "Ada Lovelace");
    }

    #[test]
    fn test_enrollment_rejects_empty_name() {
        assert_eq!(
            EnrollmentRequest::new("", image(3)).unwrap_err(),
            ValidationError::EmptyName
        );
        assert_eq!(
            EnrollmentRequest::new("   \t ", image(3)).unwrap_err(),
            ValidationError::EmptyName
        );
    }

    #[test]
    fn test_enrollment_image_count_bounds() {
        for n in [0, 1, 5, 9] {
            assert_eq!(
                EnrollmentRequest::new("Ada", image(n)).unwrap_err(),
                ValidationError::ImageCount(n),
                "count {n} should be rejected"
            );
        }
        for n in [2, 3, 4] {
            assert!(EnrollmentRequest::new("Ada", image(n)).is_ok());
        }
    }

    #[test]
    fn test_captured_frame_data_url() {
        let frame = CapturedFrame {
            width: 640,
            height: 480,
            encoding: FrameEncoding::JpegBase64,
            payload: "AAAA".to_string(),
        };
        assert_eq!(frame.to_data_url(), "data:image/jpeg;base64,AAAA");
        assert_eq!(frame.encoding.to_string(), "jpeg-base64");
    }

    #[test]
    fn test_validation_error_messages_are_actionable() {
        let count = ValidationError::ImageCount(7).to_string();
        assert!(count.contains('2') && count.contains('4') && count.contains('7'));
        assert!(ValidationError::EmptyName.to_string().contains("empty"));
    }
}
