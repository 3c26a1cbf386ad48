//! Account store port (driven/secondary port)
//!
//! Remote operations against the destination account-management system.
//! The adapter owns one authenticated session and reuses it for every call.
//!
//! ## Design Notes
//!
//! - One method per remote operation, no retries: the engine decides
//!   whether a failure is fatal (read phases) or isolated (write phases).
//! - DTOs mirror the remote payloads; the engine maps them to `User`.

use serde::{Deserialize, Serialize};

/// One entry of the destination user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Login name (the UID)
    pub login: String,
}

/// Account fields held by the destination for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Payload for creating a destination account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    pub login: String,
    /// Left blank: authentication is delegated to PAM
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub use_pam_auth: bool,
}

/// Port trait for destination account operations
#[async_trait::async_trait]
pub trait IAccountStore: Send + Sync {
    /// Lists every account known to the destination
    async fn list_users(&self) -> anyhow::Result<Vec<UserSummary>>;

    /// Fetches name and email for `login`
    async fn get_details(&self, login: &str) -> anyhow::Result<AccountDetails>;

    /// Lists the role names currently granted to `login`
    async fn list_roles(&self, login: &str) -> anyhow::Result<Vec<String>>;

    /// Grants `role` to `login`
    async fn add_role(&self, login: &str, role: &str) -> anyhow::Result<()>;

    /// Revokes `role` from `login`
    async fn remove_role(&self, login: &str, role: &str) -> anyhow::Result<()>;

    /// Creates a new account
    async fn create_user(&self, account: &NewAccount) -> anyhow::Result<()>;

    /// Replaces name and email of `login`
    async fn set_details(&self, login: &str, details: &AccountDetails) -> anyhow::Result<()>;

    /// Enables or disables PAM authentication for `login`
    async fn use_pam_authentication(&self, login: &str, enabled: bool) -> anyhow::Result<()>;

    /// Deletes the account `login`
    async fn delete_user(&self, login: &str) -> anyhow::Result<()>;
}
