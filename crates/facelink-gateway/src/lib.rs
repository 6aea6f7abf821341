//! facelink-gateway — Stateless HTTP transport to the recognition service.
//!
//! The gateway carries no business rules: every call is single-shot and
//! non-retrying, and server-reported error detail is surfaced verbatim.
//! Retry and reconciliation policy belongs to the controllers.

pub mod api;
pub mod client;
mod wire;

pub use api::{GatewayError, RecognitionApi};
pub use client::HttpGateway;
