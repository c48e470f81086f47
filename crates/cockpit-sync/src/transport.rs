//! Remote store access
//!
//! [`Transport`] is the seam between the queue and the network. Responses
//! are folded into a [`WriteOutcome`] that decides what the queue does with
//! the entry:
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 2xx | [`WriteOutcome::Success`] |
//! | 409 | [`WriteOutcome::Conflict`], removed like a success |
//! | 413 | [`WriteOutcome::PayloadTooLarge`], dropped, never retried |
//! | other 4xx | [`WriteOutcome::Rejected`], dropped |
//! | 1xx, 3xx, 5xx, network, timeout | [`WriteOutcome::Retry`] |

use crate::error::TransportError;
use crate::payload::CockpitPayload;
use async_trait::async_trait;
use cockpit_model::{Cockpit, EntityId};
use serde::Deserialize;
use std::time::Duration;

/// Raw answer to a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub status: u16,
    pub body: String,
}

impl WriteResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 with an empty body
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200, "")
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server message: `error` or `message` field of a JSON body, else the
    /// raw body
    #[must_use]
    pub fn message(&self) -> String {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            message: Option<String>,
        }
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .unwrap_or_else(|| self.body.trim().to_string())
    }
}

/// What the queue does with a write after one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    Conflict,
    PayloadTooLarge,
    Rejected { status: u16, message: String },
    Retry { reason: String },
}

impl WriteOutcome {
    /// Classify the result of one write attempt
    #[must_use]
    pub fn classify(result: Result<WriteResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Success,
            Ok(response) => Self::from_status(response.status, response.message()),
            Err(TransportError::Status { code, message }) => Self::from_status(code, message),
            Err(e) if e.is_retryable() => Self::Retry {
                reason: e.to_string(),
            },
            Err(e) => Self::Rejected {
                status: 0,
                message: e.to_string(),
            },
        }
    }

    fn from_status(status: u16, message: String) -> Self {
        match status {
            409 => Self::Conflict,
            413 => Self::PayloadTooLarge,
            s @ 400..=499 => Self::Rejected { status: s, message },
            s => Self::Retry {
                reason: format!("server returned {s}: {message}"),
            },
        }
    }
}

/// Access to the remote cockpit store
#[async_trait]
pub trait Transport: Send + Sync {
    /// Replace a cockpit document
    async fn put_cockpit(
        &self,
        id: &EntityId,
        payload: &CockpitPayload,
    ) -> Result<WriteResponse, TransportError>;

    /// Fetch a cockpit document
    async fn fetch_cockpit(&self, id: &EntityId) -> Result<Cockpit, TransportError>;

    /// Cheap connectivity probe
    async fn health_check(&self) -> Result<(), TransportError>;
}

/// [`Transport`] over HTTP
///
/// `PUT /cockpits/{id}`, `GET /cockpits/{id}`, `HEAD /health`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Client for `base_url` with a per-request timeout
    ///
    /// # Errors
    /// `TransportError::Config` if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send a bearer token with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cockpit_url(&self, id: &EntityId) -> String {
        format!("{}/cockpits/{id}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn map_reqwest(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn put_cockpit(
        &self,
        id: &EntityId,
        payload: &CockpitPayload,
    ) -> Result<WriteResponse, TransportError> {
        let response = self
            .authorize(self.client.put(self.cockpit_url(id)))
            .json(payload)
            .send()
            .await
            .map_err(|e| map_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| map_reqwest(&e))?;
        Ok(WriteResponse { status, body })
    }

    async fn fetch_cockpit(&self, id: &EntityId) -> Result<Cockpit, TransportError> {
        let response = self
            .authorize(self.client.get(self.cockpit_url(id)))
            .send()
            .await
            .map_err(|e| map_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| map_reqwest(&e))?;
        if !(200..300).contains(&status) {
            let message = WriteResponse::new(status, body).message();
            return Err(TransportError::Status {
                code: status,
                message,
            });
        }
        Cockpit::from_json(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let response = self
            .authorize(self.client.head(format!("{}/health", self.base_url)))
            .send()
            .await
            .map_err(|e| map_reqwest(&e))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: u16, body: &str) -> WriteOutcome {
        WriteOutcome::classify(Ok(WriteResponse::new(status, body)))
    }

    #[test]
    fn status_codes_map_to_outcomes() {
        assert_eq!(classify(200, r#"{"updatedAt":"2024-05-01T10:00:00Z"}"#), WriteOutcome::Success);
        assert_eq!(classify(409, "taken"), WriteOutcome::Conflict);
        assert_eq!(classify(413, ""), WriteOutcome::PayloadTooLarge);
        assert_eq!(
            classify(403, r#"{"error":"forbidden"}"#),
            WriteOutcome::Rejected {
                status: 403,
                message: "forbidden".into()
            }
        );
        assert!(matches!(classify(502, "bad gateway"), WriteOutcome::Retry { .. }));
    }

    #[test]
    fn transport_errors_map_to_outcomes() {
        assert!(matches!(
            WriteOutcome::classify(Err(TransportError::Network("refused".into()))),
            WriteOutcome::Retry { .. }
        ));
        assert!(matches!(
            WriteOutcome::classify(Err(TransportError::Timeout)),
            WriteOutcome::Retry { .. }
        ));
        assert_eq!(
            WriteOutcome::classify(Err(TransportError::Status {
                code: 409,
                message: String::new()
            })),
            WriteOutcome::Conflict
        );
    }

    #[test]
    fn informational_and_redirect_statuses_are_retried() {
        for status in [102, 301, 307] {
            let outcome = classify(status, "moved");
            assert!(matches!(outcome, WriteOutcome::Retry { .. }), "{status}: {outcome:?}");
        }
        assert!(matches!(
            WriteOutcome::classify(Err(TransportError::Status {
                code: 302,
                message: String::new()
            })),
            WriteOutcome::Retry { .. }
        ));
    }

    #[test]
    fn http_transport_trims_base_url() {
        let transport =
            HttpTransport::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080/api");
        assert_eq!(
            transport.cockpit_url(&EntityId::new("c1")),
            "http://localhost:8080/api/cockpits/c1"
        );
    }
}
