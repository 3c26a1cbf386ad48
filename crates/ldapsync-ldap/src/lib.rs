//! uyuni-ldap-sync LDAP adapter
//!
//! Implements the [`IDirectory`](ldapsync_core::ports::IDirectory) port on
//! top of `ldap3`: one connection, one simple bind, whole-subtree searches.
//!
//! ## Modules
//!
//! - [`directory`] - Connection handling and the port implementation

pub mod directory;

use thiserror::Error;

/// LDAP result code for invalid credentials
pub const INVALID_CREDENTIALS: u32 = 49;

/// LDAP result code for a search base that does not exist
pub const NO_SUCH_OBJECT: u32 = 32;

/// Errors raised while talking to the directory server
#[derive(Debug, Error)]
pub enum LdapError {
    /// The TCP/TLS connection could not be established
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// The server rejected the bind credentials
    #[error("Invalid credentials for bind DN '{0}'")]
    AuthenticationFailed(String),

    /// The bind failed for another reason
    #[error("Bind as '{dn}' failed with code {rc}: {text}")]
    BindRejected { dn: String, rc: u32, text: String },

    /// A search request failed at the protocol level
    #[error("Search under '{base_dn}' failed: {source}")]
    Search {
        base_dn: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// A search base that must exist (role, group, all-users) is missing
    #[error("Search base '{0}' does not exist")]
    NoSuchObject(String),

    /// A transport error outside of bind and search
    #[error("LDAP error: {0}")]
    Protocol(#[from] ldap3::LdapError),
}
