//! LdapDirectory - IDirectory implementation backed by `ldap3`
//!
//! ## Design Notes
//!
//! - The connection driver runs on its own task; the [`Ldap`] handle is
//!   cheap to clone, so each search works on a clone and port methods can
//!   take `&self`.
//! - Searches never dereference aliases.
//! - `search` fails when its base DN does not exist; only `lookup` of a
//!   member DN treats a missing entry as "no entry found".

use std::time::Duration;

use anyhow::Result;
use ldap3::{
    DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions,
    SearchResult,
};
use tracing::{debug, info, warn};

use ldapsync_core::config::DirectoryConfig;
use ldapsync_core::ports::{DirectoryEntry, IDirectory, ANY_OBJECT_FILTER};

use crate::{LdapError, INVALID_CREDENTIALS, NO_SUCH_OBJECT};

// ============================================================================
// Connection settings
// ============================================================================

/// Everything needed to open and bind one directory session
#[derive(Debug, Clone)]
pub struct LdapSettings {
    pub host: String,
    pub port: u16,
    /// Use `ldaps://`
    pub ssl: bool,
    /// Upgrade a plain connection with StartTLS
    pub starttls: bool,
    pub timeout: Duration,
    pub bind_dn: String,
    pub password: String,
}

impl LdapSettings {
    /// Connection URL derived from host, port and transport
    pub fn url(&self) -> String {
        let scheme = if self.ssl { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl From<&DirectoryConfig> for LdapSettings {
    fn from(config: &DirectoryConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            ssl: config.ssl,
            starttls: config.starttls && !config.ssl,
            timeout: Duration::from_secs(config.timeout),
            bind_dn: config.user.clone(),
            password: config.password.clone(),
        }
    }
}

// ============================================================================
// LdapDirectory
// ============================================================================

/// A bound directory session
pub struct LdapDirectory {
    ldap: Ldap,
    url: String,
}

impl LdapDirectory {
    /// Connects and performs a simple bind
    ///
    /// An empty bind DN performs an anonymous bind.
    #[tracing::instrument(skip(settings), fields(url = %settings.url()))]
    pub async fn connect(settings: &LdapSettings) -> Result<Self, LdapError> {
        let url = settings.url();
        debug!(starttls = settings.starttls, "Connecting to directory");

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(settings.timeout)
            .set_starttls(settings.starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|source| LdapError::Connect {
                url: url.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!(error = %err, "LDAP connection driver error");
            }
        });

        let result = ldap
            .simple_bind(&settings.bind_dn, &settings.password)
            .await?;

        match result.rc {
            0 => {}
            INVALID_CREDENTIALS => {
                return Err(LdapError::AuthenticationFailed(settings.bind_dn.clone()));
            }
            rc => {
                return Err(LdapError::BindRejected {
                    dn: settings.bind_dn.clone(),
                    rc,
                    text: result.text,
                });
            }
        }

        info!(url = %url, bind_dn = %settings.bind_dn, "Directory session established");
        Ok(Self { ldap, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ends the session; unbind failures are only logged
    pub async fn disconnect(&self) {
        let mut ldap = self.ldap.clone();
        match ldap.unbind().await {
            Ok(()) => debug!(url = %self.url, "Directory session closed"),
            Err(err) => warn!(error = %err, "Error during LDAP unbind"),
        }
    }
}

/// Converts a raw search entry into the port DTO
///
/// Binary attributes are dropped; none of the synchronized fields is binary.
pub(crate) fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
    DirectoryEntry {
        dn: entry.dn,
        attributes: entry.attrs,
    }
}

impl LdapDirectory {
    /// Subtree search; `None` when `base_dn` does not exist
    async fn subtree_search(
        &self,
        base_dn: &str,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Option<Vec<DirectoryEntry>>, LdapError> {
        let mut ldap = self.ldap.clone();
        let search_error = |source| LdapError::Search {
            base_dn: base_dn.to_string(),
            source,
        };

        let SearchResult(entries, result) = ldap
            .with_search_options(SearchOptions::new().deref(DerefAliases::Never))
            .search(base_dn, Scope::Subtree, filter, attributes.to_vec())
            .await
            .map_err(search_error)?;

        if result.rc == NO_SUCH_OBJECT {
            return Ok(None);
        }
        result.success().map_err(search_error)?;

        Ok(Some(
            entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(to_directory_entry)
                .collect(),
        ))
    }
}

#[async_trait::async_trait]
impl IDirectory for LdapDirectory {
    #[tracing::instrument(skip(self, attributes))]
    async fn search(
        &self,
        base_dn: &str,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        let entries = self
            .subtree_search(base_dn, filter, attributes)
            .await?
            .ok_or_else(|| LdapError::NoSuchObject(base_dn.to_string()))?;

        debug!(count = entries.len(), "Search completed");
        Ok(entries)
    }

    #[tracing::instrument(skip(self, attributes))]
    async fn lookup(&self, dn: &str, attributes: &[&str]) -> Result<Vec<DirectoryEntry>> {
        match self.subtree_search(dn, ANY_OBJECT_FILTER, attributes).await? {
            Some(entries) => Ok(entries),
            None => {
                debug!("Entry does not exist");
                Ok(Vec::new())
            }
        }
    }
}
