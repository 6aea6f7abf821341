//! Wire shapes of the remote recognition service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct PersonsWire {
    pub persons: Vec<PersonWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonWire {
    pub name: String,
    pub images_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckWire {
    pub message: String,
}

/// 4xx error body: `{ "detail": "..." }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DetailWire {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecognizeRequestWire {
    pub image: String,
}

/// `name: null` is a well-formed "no match", not an error.
#[derive(Debug, Deserialize)]
pub(crate) struct RecognizeWire {
    pub name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub message: String,
}
