//! UyuniAccountStore - IAccountStore implementation for the Uyuni API
//!
//! Wraps a logged-in [`UyuniClient`] and maps the `user.*` API methods to
//! the account store port.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use ldapsync_core::ports::{AccountDetails, IAccountStore, NewAccount, UserSummary};

use crate::client::UyuniClient;

/// One entry of `user.listUsers`
#[derive(Debug, Deserialize)]
struct ListedUser {
    login: String,
}

/// Fields of `user.getDetails` used for comparison
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserDetails {
    first_name: String,
    last_name: String,
    email: String,
}

/// The API encodes booleans of these calls as integers
fn flag(enabled: bool) -> i32 {
    i32::from(enabled)
}

pub struct UyuniAccountStore {
    client: UyuniClient,
}

impl UyuniAccountStore {
    /// `client` must already be logged in
    pub fn new(client: UyuniClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &UyuniClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IAccountStore for UyuniAccountStore {
    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users: Vec<ListedUser> = self
            .client
            .get("user.listUsers", &[])
            .await
            .context("Failed to list Uyuni users")?;

        Ok(users
            .into_iter()
            .map(|user| UserSummary { login: user.login })
            .collect())
    }

    async fn get_details(&self, login: &str) -> Result<AccountDetails> {
        let details: UserDetails = self
            .client
            .get("user.getDetails", &[("login", login)])
            .await
            .with_context(|| format!("Failed to get details of '{login}'"))?;

        Ok(AccountDetails {
            first_name: details.first_name,
            last_name: details.last_name,
            email: details.email,
        })
    }

    async fn list_roles(&self, login: &str) -> Result<Vec<String>> {
        self.client
            .get("user.listRoles", &[("login", login)])
            .await
            .with_context(|| format!("Failed to list roles of '{login}'"))
    }

    async fn add_role(&self, login: &str, role: &str) -> Result<()> {
        self.client
            .post::<serde_json::Value, _>("user.addRole", &json!({ "login": login, "role": role }))
            .await
            .with_context(|| format!("Failed to add role '{role}' to '{login}'"))?;
        Ok(())
    }

    async fn remove_role(&self, login: &str, role: &str) -> Result<()> {
        self.client
            .post::<serde_json::Value, _>(
                "user.removeRole",
                &json!({ "login": login, "role": role }),
            )
            .await
            .with_context(|| format!("Failed to remove role '{role}' from '{login}'"))?;
        Ok(())
    }

    async fn create_user(&self, account: &NewAccount) -> Result<()> {
        let body = json!({
            "login": account.login,
            "password": account.password,
            "firstName": account.first_name,
            "lastName": account.last_name,
            "email": account.email,
            "usePamAuth": flag(account.use_pam_auth),
        });
        self.client
            .post::<serde_json::Value, _>("user.create", &body)
            .await
            .with_context(|| format!("Failed to create user '{}'", account.login))?;
        Ok(())
    }

    async fn set_details(&self, login: &str, details: &AccountDetails) -> Result<()> {
        let body = json!({
            "login": login,
            "details": {
                "first_name": details.first_name,
                "last_name": details.last_name,
                "email": details.email,
            },
        });
        self.client
            .post::<serde_json::Value, _>("user.setDetails", &body)
            .await
            .with_context(|| format!("Failed to set details of '{login}'"))?;
        Ok(())
    }

    async fn use_pam_authentication(&self, login: &str, enabled: bool) -> Result<()> {
        self.client
            .post::<serde_json::Value, _>(
                "user.usePamAuthentication",
                &json!({ "login": login, "pam_value": flag(enabled) }),
            )
            .await
            .with_context(|| format!("Failed to set PAM authentication of '{login}'"))?;
        Ok(())
    }

    async fn delete_user(&self, login: &str) -> Result<()> {
        self.client
            .post::<serde_json::Value, _>("user.delete", &json!({ "login": login }))
            .await
            .with_context(|| format!("Failed to delete user '{login}'"))?;
        Ok(())
    }
}
