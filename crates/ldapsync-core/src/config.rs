//! Configuration module for uyuni-ldap-sync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and conversion into the domain
//! objects the reconciliation engine consumes. Configuration is loaded once
//! per run and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{AttributeMap, FrozenSet, RoleSource};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub directory: DirectoryConfig,
    pub spacewalk: SpacewalkConfig,
    pub logging: LoggingConfig,
}

/// Directory (LDAP) connection and mapping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub host: String,
    pub port: u16,
    /// Connect with `ldaps://` instead of `ldap://`.
    pub ssl: bool,
    /// Upgrade a plain connection with StartTLS.
    pub starttls: bool,
    /// Connection timeout in seconds.
    pub timeout: u64,
    /// Bind DN.
    pub user: String,
    pub password: String,
    /// Base DN holding every person entry, used to detect removals.
    pub allusers: String,
    /// UIDs never touched by synchronization.
    pub frozen: Vec<String>,
    /// Organizational role DN -> destination roles.
    pub roles: BTreeMap<String, Vec<String>>,
    /// Group DN -> destination roles.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Base DN -> (canonical attribute -> directory attribute).
    pub attrmap: BTreeMap<String, BTreeMap<String, String>>,
}

/// Destination (Uyuni server API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacewalkConfig {
    /// API root, e.g. `https://uyuni.example.com/rhn/manager/api`.
    pub url: String,
    /// Verify the server certificate.
    pub checkssl: bool,
    pub user: String,
    pub password: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        Ok(config)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/uyuni-ldap-sync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("uyuni-ldap-sync")
            .join("config.yaml")
    }

    /// Copy of the configuration with every password replaced.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.directory.password.is_empty() {
            config.directory.password = REDACTED.to_string();
        }
        if !config.spacewalk.password.is_empty() {
            config.spacewalk.password = REDACTED.to_string();
        }
        config
    }

    // --- Domain conversion ---

    pub fn frozen_set(&self) -> FrozenSet {
        FrozenSet::new(self.directory.frozen.iter().cloned())
    }

    /// Organizational roles first, then groups.
    pub fn role_sources(&self) -> [RoleSource; 2] {
        [
            RoleSource::organizational_roles(self.directory.roles.clone()),
            RoleSource::groups(self.directory.groups.clone()),
        ]
    }

    pub fn attribute_map(&self) -> AttributeMap {
        AttributeMap::new(self.directory.attrmap.clone())
    }
}

const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 389,
            ssl: false,
            starttls: false,
            timeout: 30,
            user: String::new(),
            password: String::new(),
            allusers: String::new(),
            frozen: Vec::new(),
            roles: BTreeMap::new(),
            groups: BTreeMap::new(),
            attrmap: BTreeMap::new(),
        }
    }
}

impl Default for SpacewalkConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost/rhn/manager/api".to_string(),
            checkssl: true,
            user: String::new(),
            password: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"directory.port"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            })
        };

        // --- directory ---
        if self.directory.host.trim().is_empty() {
            push("directory.host", "must not be empty".into());
        }
        if self.directory.port == 0 {
            push("directory.port", "must be greater than 0".into());
        }
        if self.directory.ssl && self.directory.starttls {
            push(
                "directory.starttls",
                "cannot be combined with directory.ssl".into(),
            );
        }
        if self.directory.timeout == 0 {
            push("directory.timeout", "must be greater than 0".into());
        }
        if self.directory.allusers.trim().is_empty() {
            push("directory.allusers", "must not be empty".into());
        }
        if self.directory.frozen.is_empty() {
            push(
                "directory.frozen",
                "at least one frozen user holding org_admin is required".into(),
            );
        }
        if self.directory.frozen.iter().any(|uid| uid.trim().is_empty()) {
            push("directory.frozen", "contains an empty UID".into());
        }
        if self.directory.roles.is_empty() && self.directory.groups.is_empty() {
            push(
                "directory.groups",
                "no roles or groups configured; every synchronized user would be removed".into(),
            );
        }
        for (field, source) in ["directory.roles", "directory.groups"]
            .iter()
            .zip(self.role_sources().iter())
        {
            if let Err(err) = source.validate() {
                push(*field, err.to_string());
            }
        }

        // --- spacewalk ---
        if self.spacewalk.url.trim().is_empty() {
            push("spacewalk.url", "must not be empty".into());
        } else if !self.spacewalk.url.starts_with("http://")
            && !self.spacewalk.url.starts_with("https://")
        {
            push(
                "spacewalk.url",
                format!("must be an http(s) URL, got '{}'", self.spacewalk.url),
            );
        }
        if self.spacewalk.user.trim().is_empty() {
            push("spacewalk.user", "must not be empty".into());
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
