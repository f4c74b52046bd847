//! HTTP client for the expense-tracking backend service.
//!
//! The backend owns all business logic (amount parsing, categorization,
//! persistence); this module only ships one JSON request per user message
//! and classifies what came back.

use crate::config::Settings;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure classification for a relay call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced an HTTP response (connection refused,
    /// DNS, TLS, socket-level timeout).
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api {
        /// HTTP status the backend returned
        status: StatusCode,
        /// Raw response body, possibly empty
        body: String,
    },
    /// The response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(String),
    /// Anything else, stringified.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl BackendError {
    /// True for failures at the network/HTTP layer, which get their own
    /// user-facing reply in addition to the generic one.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }

    /// Response body the remote returned alongside the failure, if any.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body.as_str()),
            Self::Network(_) | Self::Json(_) | Self::Unknown(_) => None,
        }
    }
}

/// Body of the outbound relay call.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseRequest {
    /// String form of the Telegram user id
    pub telegram_id: String,
    /// Raw user-entered text
    pub message: String,
}

/// Backend response envelope.
///
/// Every field is optional: the body is external input and must be looked
/// up, never assumed present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseResponse {
    /// Backend-reported status, any JSON shape
    #[serde(default)]
    pub status: Option<Value>,
    /// Human-readable backend message, any JSON shape
    #[serde(default)]
    pub message: Option<Value>,
    /// Expense payload, present only when the backend recognized an expense
    #[serde(default)]
    pub data: Option<ExpenseData>,
}

/// Expense fields inside a successful response. Sibling fields the backend
/// may send (amount, description) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseData {
    /// Category the backend assigned
    #[serde(default)]
    pub category: Option<String>,
}

impl ExpenseResponse {
    /// Category assigned by the backend, when present and non-empty.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.category.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Backend status rendered for log entries.
    #[must_use]
    pub fn status_label(&self) -> String {
        field_label(&self.status)
    }

    /// Backend message rendered for log entries.
    #[must_use]
    pub fn message_label(&self) -> String {
        field_label(&self.message)
    }
}

/// Render an optional backend field without the `Option`/`Value` wrappers:
/// plain strings stay unquoted, other JSON shapes keep their JSON form,
/// absent fields become "-".
fn field_label(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

/// Client for the backend service configured at startup.
pub struct BackendClient {
    http: HttpClient,
    url: String,
}

impl BackendClient {
    /// Create a client pointing at the configured backend endpoint.
    ///
    /// No request timeout is set: a hanging backend blocks only the one
    /// update being handled, never the whole process.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: HttpClient::new(),
            url: settings.bot_service_url.clone(),
        }
    }

    /// Issue the single outbound POST for one inbound message.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Network` when no HTTP response was received,
    /// `BackendError::Api` on a non-success status (with the returned body),
    /// `BackendError::Unknown` if the success body could not be read, and
    /// `BackendError::Json` if it was not the expected shape.
    pub async fn relay(
        &self,
        telegram_id: String,
        message: String,
    ) -> Result<ExpenseResponse, BackendError> {
        let body = ExpenseRequest {
            telegram_id,
            message,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Unknown(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| BackendError::Json(e.to_string()))
    }
}
