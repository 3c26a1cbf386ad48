//! Domain error types
//!
//! Validation failures raised while building domain objects from
//! configuration or remote data.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A user without a UID cannot take part in synchronization
    #[error("User UID must not be empty")]
    EmptyUid,

    /// A role mapping entry has no distinguished name
    #[error("Role mapping has an empty DN")]
    EmptyMappingDn,

    /// A role mapping entry grants no destination roles
    #[error("Role mapping for '{0}' grants no roles")]
    EmptyMappingRoles(String),

    /// A role mapping entry lists an empty role name
    #[error("Role mapping for '{0}' contains an empty role name")]
    EmptyRoleName(String),
}
