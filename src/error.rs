//! Error types for the session REST client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind reported for structured API errors and the session sentinel
pub const REST_ERROR_KIND: &str = "RESTError";

/// Message returned when no fresh access token can be obtained and the API
/// cannot be reached with the current one
pub const UNREACHABLE_MESSAGE: &str =
    "API is not successfully accessible. Please re-login and try again, otherwise, please contact support";

/// Message shown instead of a bare transport failure of kind `"Error"`
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error, please retry in a couple minutes";

/// Client error types
///
/// Raised while building a client or touching persistent storage. REST calls
/// themselves never return this type, see [`RestError`].
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure arm of a REST call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{status_text}: {message}")]
pub struct RestError {
    pub message: String,
    /// `"RESTError"` for API-shaped failures, otherwise the transport error name
    pub kind: String,
    pub status: u16,
    pub status_text: String,
}

impl RestError {
    /// The terminal error returned when a refresh was impossible or failed
    pub fn unreachable() -> Self {
        Self {
            message: UNREACHABLE_MESSAGE.to_string(),
            kind: REST_ERROR_KIND.to_string(),
            status: 403,
            status_text: "Forbidden".to_string(),
        }
    }

    /// Whether this is the "please re-login" sentinel
    pub fn is_session_expired(&self) -> bool {
        self.status == 403 && self.kind == REST_ERROR_KIND && self.message == UNREACHABLE_MESSAGE
    }

    /// Message suitable for direct display in an alert banner
    pub fn user_message(&self) -> &str {
        if self.kind == "Error" {
            INTERNAL_ERROR_MESSAGE
        } else {
            &self.message
        }
    }
}
