//! reqwest-backed implementation of [`RecognitionApi`].

use crate::api::{GatewayError, RecognitionApi};
use crate::wire::{AckWire, DetailWire, PersonsWire, RecognizeRequestWire, RecognizeWire};
use async_trait::async_trait;
use facelink_core::{CapturedFrame, EnrollmentRequest, Person, RecognitionOutcome, RegistrationAck};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP gateway to the remote recognition service.
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build a gateway against a base URL such as `http://localhost:8000`.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Transport(format!("invalid base url '{base_url}': {e}")))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// Join path segments onto the base URL with percent-encoding, so
    /// person names with spaces or slashes stay one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GatewayError::Transport("base url cannot have paths".into()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Extract the server's `{detail}` body, falling back to the status line.
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<DetailWire>(&body) {
        Ok(wire) => wire.detail,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[async_trait]
impl RecognitionApi for HttpGateway {
    async fn list_persons(&self) -> Result<Vec<Person>, GatewayError> {
        let url = self.endpoint(&["persons"])?;
        let response = self.http.get(url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(GatewayError::Transport(error_detail(response).await));
        }

        let wire: PersonsWire = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed persons response: {e}")))?;

        tracing::debug!(count = wire.persons.len(), "fetched person list");
        Ok(wire
            .persons
            .into_iter()
            .map(|p| Person {
                name: p.name,
                enrollment_image_count: p.images_count,
            })
            .collect())
    }

    async fn add_person(
        &self,
        request: &EnrollmentRequest,
    ) -> Result<RegistrationAck, GatewayError> {
        let mut form = Form::new().text("name", request.name().to_string());
        for image in request.images() {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|e| {
                    GatewayError::Transport(format!(
                        "invalid content type '{}': {e}",
                        image.content_type
                    ))
                })?;
            form = form.part("images", part);
        }

        let url = self.endpoint(&["add_person"])?;
        tracing::debug!(name = %request.name(), images = request.images().len(), "submitting enrollment");
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(GatewayError::Rejected {
                detail: error_detail(response).await,
            });
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(error_detail(response).await));
        }

        let wire: AckWire = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed add response: {e}")))?;
        Ok(RegistrationAck {
            message: wire.message,
        })
    }

    async fn delete_person(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["person", name])?;
        let response = self.http.delete(url).send().await.map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(error_detail(response).await));
        }

        tracing::debug!(name, "person deleted");
        Ok(())
    }

    async fn recognize(&self, frame: &CapturedFrame) -> Result<RecognitionOutcome, GatewayError> {
        let body = RecognizeRequestWire {
            image: frame.to_data_url(),
        };
        let url = self.endpoint(&["recognize_base64"])?;
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(error_detail(response).await));
        }

        let wire: RecognizeWire = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed recognize response: {e}")))?;

        tracing::debug!(matched = wire.name.is_some(), "recognition completed");
        Ok(RecognitionOutcome {
            matched_name: wire.name,
            confidence_percent: wire.confidence,
            message: wire.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpGateway {
        HttpGateway::new("http://localhost:8000").unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpGateway::new("not a url").is_err());
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = gateway().endpoint(&["persons"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/persons");
    }

    #[test]
    fn test_endpoint_percent_encodes_names() {
        let url = gateway().endpoint(&["person", "Ada Lovelace"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/person/Ada%20Lovelace");

        // A slash in a name must stay inside one segment
        let url = gateway().endpoint(&["person", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/person/a%2Fb");
    }
}
