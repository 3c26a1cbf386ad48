//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the reconciliation engine depends on, whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IDirectory`] - Subtree searches against the authoritative directory
//! - [`IAccountStore`] - Remote operations against the destination account store

pub mod account_store;
pub mod directory;

pub use account_store::{AccountDetails, IAccountStore, NewAccount, UserSummary};
pub use directory::{DirectoryEntry, IDirectory, ANY_OBJECT_FILTER, PERSON_FILTER};
