//! REST client with bearer authentication and one-shot token refresh

use crate::config::ClientConfig;
use crate::error::{RestError, Result, REST_ERROR_KIND};
use crate::token_store::TokenStore;
use crate::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use crate::types::{Attempt, CallOutcome, RefreshRequest, RefreshResponse};
use async_singleflight::Group;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Turn the failure of a final attempt into a [`RestError`]
///
/// API-shaped bodies keep their real status. Anything else is reported as
/// 401 Unauthorized with the transport's own message.
pub fn normalize_error(error: TransportError) -> RestError {
    if let Some(response) = &error.response {
        if let Some(message) = response.api_message() {
            return RestError {
                message,
                kind: REST_ERROR_KIND.to_string(),
                status: response.status,
                status_text: response.status_text.clone(),
            };
        }
    }

    RestError {
        message: error.message,
        kind: error.name,
        status: 401,
        status_text: "Unauthorized".to_string(),
    }
}

/// REST client that refreshes an expired access token once before failing
///
/// The access token is read from the store on every attempt, so updates made
/// by other clients sharing the store are picked up immediately.
pub struct RestClient<S, T = ReqwestTransport> {
    config: ClientConfig,
    token_store: S,
    transport: T,
    /// Deduplicates concurrent refreshes when enabled in the config
    refresh_singleflight: Group<String, String>,
}

impl<S: TokenStore> RestClient<S, ReqwestTransport> {
    /// Create a client using the reqwest transport
    pub fn new(config: ClientConfig, token_store: S) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, token_store, transport))
    }
}

impl<S: TokenStore, T: HttpTransport> RestClient<S, T> {
    /// Create a client over any transport, e.g. a test double
    pub fn with_transport(config: ClientConfig, token_store: S, transport: T) -> Self {
        Self {
            config,
            token_store,
            transport,
            refresh_singleflight: Group::new(),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the token store (for session bookkeeping by callers)
    pub fn token_store(&self) -> &S {
        &self.token_store
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path`, with a bearer token when `authenticated`
    pub async fn get<R: DeserializeOwned>(&self, path: &str, authenticated: bool) -> CallOutcome<R> {
        self.call(Method::GET, path, authenticated, None::<&()>).await
    }

    /// POST `body` as JSON to `path`
    pub async fn post<B, R>(&self, path: &str, body: &B, authenticated: bool) -> CallOutcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call(Method::POST, path, authenticated, Some(body)).await
    }

    /// PUT `body` as JSON to `path`
    pub async fn put<B, R>(&self, path: &str, body: &B, authenticated: bool) -> CallOutcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call(Method::PUT, path, authenticated, Some(body)).await
    }

    /// DELETE `path`; an empty response decodes as `null`
    pub async fn delete<R: DeserializeOwned>(&self, path: &str, authenticated: bool) -> CallOutcome<R> {
        self.call(Method::DELETE, path, authenticated, None::<&()>).await
    }

    /// Perform a request, refreshing the access token and retrying once if
    /// an authenticated attempt fails
    pub async fn call<B, R>(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
        body: Option<&B>,
    ) -> CallOutcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = match body.map(serde_json::to_value).transpose() {
            Ok(body) => body,
            Err(e) => {
                return Err(RestError {
                    message: e.to_string(),
                    kind: "EncodeError".to_string(),
                    status: 400,
                    status_text: "Bad Request".to_string(),
                })
            }
        };

        let mut attempt = Attempt::First;
        loop {
            let error = match self
                .send_once(&method, path, authenticated, body.as_ref())
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(error) => error,
            };

            match attempt {
                Attempt::First if authenticated => {
                    debug!(method = %method, path = %path, error = %error.message, "Authenticated request failed, refreshing access token");
                    if self.refresh_access_token().await.is_none() {
                        warn!(method = %method, path = %path, "No access token available, session must be re-established");
                        return Err(RestError::unreachable());
                    }
                    attempt = Attempt::Retried;
                }
                _ => return Err(normalize_error(error)),
            }
        }
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// Returns `None` when there is no session or the exchange failed. On
    /// success only the `access` field of the stored pair is replaced.
    pub async fn refresh_access_token(&self) -> Option<String> {
        if !self.config.single_flight_refresh {
            return self.do_refresh().await;
        }

        let key = self.config.refresh_path.clone();
        let (token, _err, _shared) = self
            .refresh_singleflight
            .work(&key, async {
                self.do_refresh()
                    .await
                    .ok_or_else(|| "no refresh possible".to_string())
            })
            .await;
        token
    }

    async fn do_refresh(&self) -> Option<String> {
        let tokens = self.token_store.tokens();
        if !tokens.has_session() {
            debug!("No refresh token stored, skipping refresh");
            return None;
        }

        let request = RefreshRequest {
            refresh: tokens.refresh.clone(),
        };
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode refresh request");
                return None;
            }
        };

        // Always a terminal attempt: the refresh call itself is never retried
        let response: RefreshResponse = match self
            .send_once(&Method::POST, &self.config.refresh_path, false, Some(&body))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err = normalize_error(e);
                warn!(status = %err.status, error = %err.message, "Access token refresh failed");
                return None;
            }
        };

        // Re-read so a logout or login during the exchange is not undone
        let mut current = self.token_store.tokens();
        current.access = response.access;
        if let Err(e) = self.token_store.set_tokens(&current) {
            warn!(error = %e, "Failed to persist refreshed access token");
            return None;
        }

        info!("Access token refreshed successfully");
        Some(current.access)
    }

    async fn send_once<R: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        authenticated: bool,
        body: Option<&Value>,
    ) -> std::result::Result<R, TransportError> {
        let mut headers = Vec::new();
        if authenticated {
            let access = self.token_store.tokens().access;
            headers.push((AUTHORIZATION.as_str().to_string(), format!("Bearer {access}")));
        }

        let request = TransportRequest {
            method: method.clone(),
            url: self.config.url(path),
            headers,
            body: body.cloned(),
        };
        debug!(method = %request.method, url = %request.url, authenticated, "Sending request");

        let payload = self.transport.send(request).await?;
        serde_json::from_value(payload).map_err(TransportError::decode)
    }
}
