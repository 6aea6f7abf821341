//! The gateway seam the controllers program against.

use async_trait::async_trait;
use facelink_core::{CapturedFrame, EnrollmentRequest, Person, RecognitionOutcome, RegistrationAck};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The server rejected the request; `detail` is its structured
    /// error body when present.
    #[error("{detail}")]
    Rejected { detail: String },
    #[error("person not found: {name}")]
    NotFound { name: String },
    /// Network failure or a non-2xx the server gave no detail for.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Request/response surface of the remote recognition service.
///
/// Implementations are pure transport: no validation, no retries, no
/// local state.
#[async_trait]
pub trait RecognitionApi: Send + Sync {
    /// Fetch every enrolled person.
    async fn list_persons(&self) -> Result<Vec<Person>, GatewayError>;

    /// Register a person with their reference images.
    async fn add_person(&self, request: &EnrollmentRequest)
        -> Result<RegistrationAck, GatewayError>;

    /// Delete an enrolled person by name.
    async fn delete_person(&self, name: &str) -> Result<(), GatewayError>;

    /// Match one captured frame against all enrolled persons.
    async fn recognize(&self, frame: &CapturedFrame) -> Result<RecognitionOutcome, GatewayError>;
}
