//! Uyuni HTTP/JSON API client
//!
//! Every API method `namespace.method` maps to `<api-root>/namespace/method`.
//! Reads are `GET` with query parameters, writes are `POST` with a JSON
//! body. Responses share one envelope:
//!
//! ```json
//! {"success": true, "result": ...}
//! {"success": false, "message": "..."}
//! ```
//!
//! Authentication is cookie based: `auth/login` sets `pxt-session-cookie`,
//! which is sent back with every later call.

use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use ldapsync_core::config::SpacewalkConfig;

use crate::UyuniError;

/// Name of the session cookie set by `auth/login`
pub const SESSION_COOKIE: &str = "pxt-session-cookie";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Response envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    login: &'a str,
    password: &'a str,
}

// ============================================================================
// UyuniClient
// ============================================================================

/// HTTP client bound to one Uyuni API root
pub struct UyuniClient {
    client: Client,
    base_url: Url,
    session: Option<String>,
}

impl UyuniClient {
    /// Builds a client from the destination configuration
    ///
    /// `checkssl: false` accepts any server certificate.
    pub fn new(config: &SpacewalkConfig) -> Result<Self, UyuniError> {
        if !config.checkssl {
            warn!(url = %config.url, "TLS certificate verification disabled");
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.checkssl)
            .build()?;

        Ok(Self {
            client,
            base_url: api_root(&config.url)?,
            session: None,
        })
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(base_url: impl AsRef<str>) -> Result<Self, UyuniError> {
        Ok(Self {
            client: Client::new(),
            base_url: api_root(base_url.as_ref())?,
            session: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a session; the cookie is kept for every later call
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&mut self, login: &str, password: &str) -> Result<(), UyuniError> {
        let response = self
            .client
            .post(self.endpoint("auth.login")?)
            .json(&Credentials { login, password })
            .send()
            .await?;

        let session = session_cookie(&response);
        parse_envelope::<serde_json::Value>("auth.login", response).await?;

        self.session = Some(session.ok_or(UyuniError::MissingSession)?);
        info!(url = %self.base_url, "Logged in to Uyuni");
        Ok(())
    }

    /// Closes the session; failures are only logged
    pub async fn logout(&self) {
        if self.session.is_none() {
            return;
        }
        match self
            .post::<serde_json::Value, _>("auth.logout", &serde_json::json!({}))
            .await
        {
            Ok(_) => debug!("Logged out of Uyuni"),
            Err(err) => warn!(error = %err, "Uyuni logout failed"),
        }
    }

    /// Calls a read method with query parameters
    pub async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UyuniError> {
        debug!(method, "GET");
        let response = self
            .authenticated(self.client.get(self.endpoint(method)?))?
            .query(query)
            .send()
            .await?;
        parse_envelope(method, response).await
    }

    /// Calls a write method with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, UyuniError> {
        debug!(method, "POST");
        let response = self
            .authenticated(self.client.post(self.endpoint(method)?))?
            .json(body)
            .send()
            .await?;
        parse_envelope(method, response).await
    }

    /// `user.listRoles` -> `<root>/user/listRoles`
    fn endpoint(&self, method: &str) -> Result<Url, UyuniError> {
        Ok(self.base_url.join(&method.replacen('.', "/", 1))?)
    }

    fn authenticated(&self, request: RequestBuilder) -> Result<RequestBuilder, UyuniError> {
        let session = self.session.as_ref().ok_or(UyuniError::NotLoggedIn)?;
        Ok(request.header(COOKIE, format!("{SESSION_COOKIE}={session}")))
    }
}

/// Parses `url` and makes sure relative joins stay below it
fn api_root(url: &str) -> Result<Url, UyuniError> {
    let mut root = Url::parse(url)?;
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    Ok(root)
}

/// Extracts the live session cookie from a login response
///
/// The server may also send an expired cookie of the same name to clear an
/// older session; those are skipped.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(parse_session_cookie)
        .last()
}

fn parse_session_cookie(set_cookie: &str) -> Option<String> {
    let mut parts = set_cookie.split(';').map(str::trim);
    let value = parts.next()?.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')?;
    let expired = parts.any(|attr| attr.eq_ignore_ascii_case("Max-Age=0"));
    (!expired && !value.is_empty()).then(|| value.to_string())
}

async fn parse_envelope<T: DeserializeOwned>(
    method: &str,
    response: Response,
) -> Result<T, UyuniError> {
    let status = response.status();
    let body = response.text().await?;

    let envelope: ApiResponse = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(UyuniError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }
        Err(err) => {
            return Err(UyuniError::InvalidResponse {
                method: method.to_string(),
                message: err.to_string(),
            });
        }
    };

    if !envelope.success {
        return Err(UyuniError::Api {
            method: method.to_string(),
            message: envelope
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        });
    }

    serde_json::from_value(envelope.result).map_err(|err| UyuniError::InvalidResponse {
        method: method.to_string(),
        message: err.to_string(),
    })
}
