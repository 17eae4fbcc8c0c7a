//! HTTP transport for credential submission
//!
//! POSTs the field values as JSON and expects a session back:
//!
//! ```text
//! POST {endpoint}   {"email": "...", "password": "..."}
//! 200               {"token": "...", "user": "..."}
//! 4xx / 5xx         {"message": "..."} or {"error": "..."} or plain text
//! ```

use std::time::Duration;

use async_trait::async_trait;
use form_dispatch::{FieldValues, Session, Transport, TransportError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Error message from a failed response body
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message.or(parsed.error),
        Err(_) => Some(body.to_string()),
    }
}

/// Map a non-success status to a transport error
pub fn classify(status: u16, message: String) -> TransportError {
    match status {
        401 | 403 => TransportError::Unauthorized(message),
        400 | 409 | 422 => TransportError::Rejected(message),
        status => TransportError::Server { status, message },
    }
}

/// [`Transport`] backed by a JSON HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit_credentials(&self, values: FieldValues) -> Result<Session, TransportError> {
        tracing::debug!(endpoint = %self.endpoint, "submitting credentials");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&values)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Session>()
                .await
                .map_err(|e| TransportError::Server {
                    status: status.as_u16(),
                    message: format!("unreadable session: {e}"),
                });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                tracing::debug!(%error, status = status.as_u16(), "could not read error body");
                String::new()
            }
        };
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        Err(classify(status.as_u16(), message))
    }
}
