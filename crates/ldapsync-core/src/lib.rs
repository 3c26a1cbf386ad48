//! uyuni-ldap-sync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `User`, `RoleSource`, `AttributeMap`, `FrozenSet`
//! - **Classification** - keyed merge of directory users into the destination snapshot
//! - **Port definitions** - Traits for adapters: `IDirectory`, `IAccountStore`
//! - **Configuration** - YAML configuration loading and validation
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`ldapsync-ldap`, `ldapsync-uyuni`). The reconciliation engine in
//! `ldapsync-sync` drives the domain through those ports.

pub mod config;
pub mod domain;
pub mod ports;
