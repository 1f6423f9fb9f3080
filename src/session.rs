//! Login, registration and session bookkeeping
//!
//! These helpers sit on top of [`RestClient`]. The client never writes a
//! session by itself; callers persist a [`SessionGrant`] explicitly.

use crate::client::RestClient;
use crate::error::Result;
use crate::token_store::{TokenStore, TOKENS_KEY, USERNAME_KEY};
use crate::transport::HttpTransport;
use crate::types::{CallOutcome, Credentials, SessionGrant, TokenPair};
use tracing::info;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REGISTRATION_PATH: &str = "/auth/register/";

/// Seed empty session values for keys that were never written
pub fn bootstrap(store: &impl TokenStore) -> Result<()> {
    if store.get(TOKENS_KEY).is_none() {
        store.set_tokens(&TokenPair::default())?;
    }
    if store.get(USERNAME_KEY).is_none() {
        store.set_username("")?;
    }
    Ok(())
}

/// Log in with existing credentials (unauthenticated PUT)
pub async fn login<S: TokenStore, T: HttpTransport>(
    client: &RestClient<S, T>,
    credentials: &Credentials,
) -> CallOutcome<SessionGrant> {
    client.put(LOGIN_PATH, credentials, false).await
}

/// Register a new account (unauthenticated POST)
pub async fn register<S: TokenStore, T: HttpTransport>(
    client: &RestClient<S, T>,
    credentials: &Credentials,
) -> CallOutcome<SessionGrant> {
    client.post(REGISTRATION_PATH, credentials, false).await
}

/// Store the tokens and username of a successful login or registration
pub fn persist(store: &impl TokenStore, grant: &SessionGrant) -> Result<()> {
    store.set_tokens(&grant.tokens)?;
    store.set_username(&grant.username)?;
    info!(username = %grant.username, "Session stored");
    Ok(())
}

/// Forget the current session
pub fn logout(store: &impl TokenStore) -> Result<()> {
    store.set_tokens(&TokenPair::default())?;
    store.set_username("")?;
    info!("Session cleared");
    Ok(())
}

pub fn current_username(store: &impl TokenStore) -> String {
    store.username()
}

pub fn is_logged_in(store: &impl TokenStore) -> bool {
    store.tokens().has_session()
}
