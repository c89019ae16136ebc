use std::time::Duration;

use thiserror::Error;

/// Message shown when the registry cannot be reached after all retries.
pub const CONNECTIVITY_MESSAGE: &str = "Unable to reach the plot registry. Please try again.";

/// Message shown when the registry answers with something unusable.
pub const MALFORMED_MESSAGE: &str = "The plot registry returned data in an unexpected format.";

/// Failure of one registry call.
///
/// Only `Network` and `Timeout` are retried. `Http` carries the server's
/// message so it can be shown verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Connectivity failures: the request never produced a response.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }

    pub fn is_retryable(&self) -> bool {
        self.is_connectivity()
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => CONNECTIVITY_MESSAGE.to_string(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Malformed(_) => MALFORMED_MESSAGE.to_string(),
        }
    }

    /// Build the error for a completed non-2xx response.
    pub fn from_status(status: u16, body: &str) -> ApiError {
        let message =
            error_detail(body).unwrap_or_else(|| format!("Request failed with status {status}"));
        ApiError::Http { status, message }
    }
}

/// Extract the `detail` message from an error body.
///
/// Accepts `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}]}`, taking the first message.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

/// Reasons a whole plot response is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("empty response body")]
    EmptyBody,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not a FeatureCollection")]
    NotFeatureCollection,
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        ApiError::Malformed(e.to_string())
    }
}
