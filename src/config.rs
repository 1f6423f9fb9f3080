//! Client configuration

use crate::error::{ClientError, Result};
use std::time::Duration;

/// Endpoint exchanging a refresh token for a new access token
pub const REFRESH_PATH: &str = "/auth/refresh_tokens/";

pub const DEV_API_URL: &str = "http://localhost:8000/api";
pub const PROD_API_URL: &str = "/api";

/// Deployment environment, selects the default API URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// `APP_CONFIG=dev` selects development, anything else production
    pub fn from_env() -> Self {
        match std::env::var("APP_CONFIG").as_deref() {
            Ok("dev") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn api_url(self) -> &'static str {
        match self {
            Self::Development => DEV_API_URL,
            Self::Production => PROD_API_URL,
        }
    }
}

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prepended to every request path
    pub api_url: String,

    /// Path of the token refresh endpoint
    /// Default: `/auth/refresh_tokens/`
    pub refresh_path: String,

    /// Request timeout applied by the HTTP transport, none by default
    pub timeout_secs: Option<u64>,

    /// Share one refresh exchange between concurrent callers
    /// Default: false
    pub single_flight_refresh: bool,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            timeout_secs: None,
            single_flight_refresh: false,
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        Self::new(environment.api_url())
    }

    /// Build from `APP_CONFIG`, with `API_URL` overriding the environment default
    pub fn from_env() -> Result<Self> {
        let api_url = match std::env::var("API_URL") {
            Ok(url) if url.trim().is_empty() => {
                return Err(ClientError::Configuration("API_URL is set but empty".to_string()))
            }
            Ok(url) => url,
            Err(_) => Environment::from_env().api_url().to_string(),
        };

        let mut config = Self::new(api_url);
        if let Ok(raw) = std::env::var("API_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| {
                ClientError::Configuration(format!("Invalid API_TIMEOUT_SECS {raw:?}: {e}"))
            })?;
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_single_flight_refresh(mut self, enabled: bool) -> Self {
        self.single_flight_refresh = enabled;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Full URL for a request path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
