//! HTTP transport used by the REST client

use reqwest::{Client, ClientBuilder, Method};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// A single outgoing request, already resolved against the base URL
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response attached to a failed request
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body, or the raw text as a JSON string
    pub body: Value,
}

impl ErrorResponse {
    /// The `message` field of an API-shaped error body
    ///
    /// Missing, `null`, `false`, `0` and empty-string messages count as
    /// absent. Non-string values are rendered as JSON text.
    pub fn api_message(&self) -> Option<String> {
        match self.body.get("message")? {
            Value::Null | Value::Bool(false) => None,
            Value::String(m) if m.is_empty() => None,
            Value::String(m) => Some(m.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Failure reported by a transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub message: String,
    /// Short classification of the failure, e.g. `"TimeoutError"`
    pub name: String,
    /// Set when the server answered with a non-success status
    pub response: Option<ErrorResponse>,
}

impl TransportError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: name.into(),
            response: None,
        }
    }

    /// Error for a non-success HTTP status
    pub fn status(status: u16, status_text: impl Into<String>, body: Value) -> Self {
        Self {
            message: format!("Request failed with status code {status}"),
            name: "Error".to_string(),
            response: Some(ErrorResponse {
                status,
                status_text: status_text.into(),
                body,
            }),
        }
    }

    pub(crate) fn decode(e: serde_json::Error) -> Self {
        Self::new("DecodeError", e.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let name = if e.is_timeout() {
            "TimeoutError"
        } else if e.is_connect() {
            "ConnectionError"
        } else if e.is_builder() {
            "RequestError"
        } else if e.is_decode() {
            "DecodeError"
        } else {
            "Error"
        };
        Self::new(name, e.to_string())
    }
}

/// Issues HTTP requests and yields JSON payloads
pub trait HttpTransport: Send + Sync + 'static {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = std::result::Result<Value, TransportError>> + Send;
}

/// Transport backed by a reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = ClientBuilder::new().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<Value, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                body,
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(TransportError::decode)
    }
}
