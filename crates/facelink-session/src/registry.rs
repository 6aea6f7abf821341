//! Person registry controller — add, list, delete enrolled persons.
//!
//! The in-memory list is always a reflection of the last successful
//! server read or mutation: a successful add triggers a wholesale
//! refresh (the server is the source of truth), a failed request leaves
//! the list untouched, and a successful delete removes the known entry
//! without a round trip.

use facelink_core::{EnrollmentImage, EnrollmentRequest, Person, ValidationError};
use facelink_gateway::{GatewayError, RecognitionApi};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server rejected the request and said why.
    #[error("{0}")]
    Rejected(String),
    #[error("person not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<GatewayError> for RegistryError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected { detail } => RegistryError::Rejected(detail),
            GatewayError::NotFound { name } => RegistryError::NotFound(name),
            GatewayError::Transport(message) => RegistryError::Transport(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Enroll,
    Delete,
}

#[derive(Default)]
struct RegistryState {
    persons: Vec<Person>,
    /// One in-flight enrollment or deletion per person name.
    pending: HashMap<String, PendingOp>,
}

pub struct PersonRegistryController<G: RecognitionApi> {
    gateway: G,
    state: Mutex<RegistryState>,
}

/// Removes its name from the pending set when the operation resolves,
/// on every exit path.
struct OpGuard<'a> {
    state: &'a Mutex<RegistryState>,
    name: String,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .expect("registry state lock poisoned")
            .pending
            .remove(&self.name);
    }
}

impl<G: RecognitionApi> PersonRegistryController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Snapshot of the current local person list.
    pub fn persons(&self) -> Vec<Person> {
        self.state
            .lock()
            .expect("registry state lock poisoned")
            .persons
            .clone()
    }

    /// Fetch the full list and replace local state wholesale.
    ///
    /// No incremental merge: partial failures can never leave the list
    /// drifted from the server.
    pub async fn refresh(&self) -> Result<(), RegistryError> {
        let fetched = self.gateway.list_persons().await?;
        let mut state = self.state.lock().expect("registry state lock poisoned");
        tracing::debug!(count = fetched.len(), "person list refreshed");
        state.persons = fetched;
        Ok(())
    }

    /// Enroll a person from 2–4 reference images.
    ///
    /// Validation runs before any network call; the gateway is never
    /// invoked for an invalid request. On success the list is refreshed
    /// from the server rather than locally appended. Returns the
    /// server's acknowledgement message.
    pub async fn submit_enrollment(
        &self,
        name: &str,
        images: Vec<EnrollmentImage>,
    ) -> Result<String, RegistryError> {
        let request = EnrollmentRequest::new(name, images)?;
        let _guard = self.claim(request.name(), PendingOp::Enroll)?;

        let ack = self.gateway.add_person(&request).await?;
        tracing::info!(name = %request.name(), "person enrolled");

        self.refresh().await?;
        Ok(ack.message)
    }

    /// Delete an enrolled person.
    ///
    /// Callers must have obtained user confirmation before invoking;
    /// confirmation is a UI-boundary concern, not controller logic. On
    /// success the entry is removed from local state immediately — the
    /// identity is known, no refresh is needed.
    pub async fn remove_person(&self, name: &str) -> Result<(), RegistryError> {
        let _guard = self.claim(name, PendingOp::Delete)?;

        self.gateway.delete_person(name).await?;

        let mut state = self.state.lock().expect("registry state lock poisoned");
        state.persons.retain(|p| p.name != name);
        tracing::info!(name, "person deleted");
        Ok(())
    }

    /// Reserve `name` for one operation.
    ///
    /// A second delete for a name already being deleted resolves
    /// `NotFound` (the entry is on its way out); every other collision
    /// is a local validation rejection.
    fn claim(&self, name: &str, op: PendingOp) -> Result<OpGuard<'_>, RegistryError> {
        let mut state = self.state.lock().expect("registry state lock poisoned");
        match state.pending.get(name) {
            Some(PendingOp::Delete) if op == PendingOp::Delete => {
                Err(RegistryError::NotFound(name.to_string()))
            }
            Some(_) => Err(ValidationError::OperationInFlight(name.to_string()).into()),
            None => {
                state.pending.insert(name.to_string(), op);
                Ok(OpGuard {
                    state: &self.state,
                    name: name.to_string(),
                })
            }
        }
    }
}
