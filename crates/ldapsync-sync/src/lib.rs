//! uyuni-ldap-sync reconciliation engine
//!
//! Provides:
//! - Role resolution from directory roles and groups
//! - Staged and full directory user sets
//! - Destination snapshot and classification
//! - Create, update and delete push passes
//!
//! ## Modules
//!
//! - [`engine`] - Orchestrates one reconciliation run (plan, then apply)
//! - [`guard`] - Refuses to run when no frozen user keeps administrator access
//! - [`resolver`] - Maps directory membership to destination roles
//! - [`staging`] - Builds [`User`](ldapsync_core::domain::User) records from directory entries

pub mod engine;
pub mod guard;
pub mod resolver;
pub mod staging;

use thiserror::Error;

/// Fatal conditions that abort a run before any destination write
#[derive(Debug, Error)]
pub enum SyncError {
    /// None of the frozen users holds the administrator role
    #[error("No frozen user holds the '{role}' role (checked: {checked:?}); refusing to synchronize")]
    LockoutGuard { role: String, checked: Vec<String> },

    /// The destination user listing or one of its detail reads failed
    #[error("Failed to read destination users: {0}")]
    DestinationSnapshot(String),

    /// A directory search failed during a read phase
    #[error("Directory search under '{base_dn}' failed: {reason}")]
    Directory { base_dn: String, reason: String },
}
