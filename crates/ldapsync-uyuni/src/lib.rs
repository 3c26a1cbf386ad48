//! uyuni-ldap-sync Uyuni adapter
//!
//! Provides:
//! - A session-based client for the Uyuni HTTP/JSON API
//! - The [`IAccountStore`](ldapsync_core::ports::IAccountStore) implementation
//!   over the `user.*` namespace
//!
//! ## Modules
//!
//! - [`client`] - Login/logout, request building and response envelopes
//! - [`store`] - Account store port implementation

pub mod client;
pub mod store;

use thiserror::Error;

/// Errors that can occur when communicating with the Uyuni API
#[derive(Debug, Error)]
pub enum UyuniError {
    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The configured API URL cannot be used as a base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a non-success HTTP status and no API envelope
    #[error("{method} returned HTTP {status}")]
    Status { method: String, status: u16 },

    /// The API reported a failure (`"success": false`)
    #[error("{method} failed: {message}")]
    Api { method: String, message: String },

    /// No call can be made before `auth/login` succeeded
    #[error("Not logged in")]
    NotLoggedIn,

    /// Login succeeded but no session cookie was returned
    #[error("No session cookie in login response")]
    MissingSession,

    /// The API response could not be parsed or was malformed
    #[error("Invalid response from {method}: {message}")]
    InvalidResponse { method: String, message: String },
}
