//! Domain entities and business logic
//!
//! - User identity records and their change-tracking flags
//! - Role sources binding directory objects to destination roles
//! - Per-base-DN attribute remapping
//! - The frozen (never synchronized) user set
//! - Classification of directory users against the destination snapshot
//! - Domain-specific error types

pub mod attribute_map;
pub mod classify;
pub mod errors;
pub mod frozen;
pub mod role_source;
pub mod user;

// Re-export commonly used types
pub use attribute_map::AttributeMap;
pub use classify::Classification;
pub use errors::DomainError;
pub use frozen::FrozenSet;
pub use role_source::{RoleSource, RoleSourceKind};
pub use user::User;
