//! Type definitions for sessions and REST payloads

use crate::error::RestError;
use serde::{Deserialize, Serialize};

/// Result of a REST call: the decoded payload or a normalized error
pub type CallOutcome<T> = std::result::Result<T, RestError>;

/// Authentication tokens (access + refresh)
///
/// An empty `refresh` token means there is no active session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn has_session(&self) -> bool {
        !self.refresh.is_empty()
    }
}

/// Login or registration payload
///
/// `secret_key` is only sent on registration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Credentials {
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret_key: None,
        }
    }

    pub fn registration(
        username: impl Into<String>,
        password: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret_key: Some(secret_key.into()),
        }
    }
}

/// Body returned by the login and registration endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub username: String,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
}

/// Position of a request in the retry sequence
///
/// A `Retried` attempt never triggers another refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retried,
}
