//! Session REST Client
//!
//! A Rust client for calling a backend REST API with bearer authentication.
//! When an authenticated call fails, the stored refresh token is exchanged for
//! a new access token and the call is retried exactly once.

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod token_store;
pub mod transport;
pub mod types;

pub use client::{normalize_error, RestClient};
pub use config::{ClientConfig, Environment};
pub use error::{ClientError, RestError, Result};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
pub use types::{Attempt, CallOutcome, Credentials, SessionGrant, TokenPair};
