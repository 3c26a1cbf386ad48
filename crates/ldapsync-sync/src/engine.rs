//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] makes the destination account store mirror
//! the directory-defined user set and each user's role assignments.
//!
//! ## Run Flow
//!
//! 1. **Guard**: abort unless a frozen user holds the administrator role
//! 2. **Read** (fatal on transport errors): destination snapshot, staged
//!    set, full directory set, classification
//! 3. **Write** (errors isolated per user): create, update, delete, then a
//!    summary
//!
//! [`ReconciliationEngine::start`] performs the read phases and returns a
//! [`SyncPlan`]; [`ReconciliationEngine::apply`] executes it. A dry run is
//! `start` alone. Calls are issued one at a time, no retries.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use ldapsync_core::config::Config;
use ldapsync_core::domain::{AttributeMap, Classification, FrozenSet, RoleSource, User};
use ldapsync_core::ports::{AccountDetails, IAccountStore, IDirectory, NewAccount, PERSON_FILTER};

use crate::guard::{self, ADMIN_ROLE};
use crate::resolver::{directory_error, RoleResolver};
use crate::staging;
use crate::SyncError;

// ============================================================================
// Settings
// ============================================================================

/// Run parameters derived from the configuration
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Base DN holding every person entry
    pub all_users_base: String,
    pub frozen: FrozenSet,
    pub role_sources: Vec<RoleSource>,
    pub attributes: AttributeMap,
    /// Role a frozen user must hold for the run to proceed
    pub admin_role: String,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            all_users_base: config.directory.allusers.clone(),
            frozen: config.frozen_set(),
            role_sources: config.role_sources().into_iter().collect(),
            attributes: config.attribute_map(),
            admin_role: ADMIN_ROLE.to_string(),
        }
    }
}

// ============================================================================
// SyncPlan / SyncReport
// ============================================================================

/// Outcome of the read phases: what a run would change
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    pub started_at: DateTime<Utc>,
    /// Frozen user that satisfied the lockout guard
    pub administrator: String,
    /// Number of users in the staged directory set
    pub staged: usize,
    /// Staged users absent from the destination
    pub new_users: Vec<User>,
    /// Destination users whose account data or roles drifted
    pub outdated_users: Vec<User>,
    /// Destination users dropped from every mapped role or group
    pub deleted_users: Vec<User>,
    /// Destination users already in agreement
    pub unchanged: usize,
}

impl SyncPlan {
    /// True when applying the plan would not issue any write
    pub fn is_empty(&self) -> bool {
        self.new_users.is_empty() && self.outdated_users.is_empty() && self.deleted_users.is_empty()
    }
}

/// A user whose creation was rejected by the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUser {
    pub uid: String,
    pub reason: String,
}

/// Summary of an applied plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Accounts created
    pub added: usize,
    /// Accounts whose update completed
    pub updated: usize,
    /// Accounts deleted
    pub removed: usize,
    /// Creation failures
    pub failed: Vec<FailedUser>,
    /// Non-fatal errors (role pushes, updates, deletions)
    pub errors: Vec<String>,
    /// Wall-clock duration from plan start in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

/// One-way directory to destination user reconciliation
pub struct ReconciliationEngine {
    directory: Arc<dyn IDirectory>,
    account_store: Arc<dyn IAccountStore>,
    settings: SyncSettings,
    resolver: RoleResolver,
}

impl ReconciliationEngine {
    pub fn new(
        directory: Arc<dyn IDirectory>,
        account_store: Arc<dyn IAccountStore>,
        config: &Config,
    ) -> Self {
        Self::with_settings(directory, account_store, SyncSettings::from_config(config))
    }

    pub fn with_settings(
        directory: Arc<dyn IDirectory>,
        account_store: Arc<dyn IAccountStore>,
        settings: SyncSettings,
    ) -> Self {
        let resolver = RoleResolver::new(settings.role_sources.iter().cloned());
        Self {
            directory,
            account_store,
            settings,
            resolver,
        }
    }

    /// Runs the read phases and classifies every user
    ///
    /// The lockout guard runs first; when it fails nothing else is read
    /// and nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<SyncPlan> {
        let started_at = Utc::now();
        info!(
            base_dn = %self.settings.all_users_base,
            frozen = self.settings.frozen.len(),
            "Starting user synchronization"
        );

        let administrator = guard::verify_frozen_administrator(
            self.account_store.as_ref(),
            &self.settings.frozen,
            &self.settings.admin_role,
        )
        .await?;

        let existing = self.refresh_existing_users().await?;
        let mut staged = self.refresh_staged_users().await?;
        let all_directory_users = self.refresh_all_directory_users().await?;

        let classification = Classification::classify(&mut staged, existing);
        let deleted_users = classification.deleted(&all_directory_users, &staged);

        let plan = SyncPlan {
            started_at,
            administrator,
            staged: staged.len(),
            new_users: classification.new_users().into_iter().cloned().collect(),
            outdated_users: classification.outdated_users().into_iter().cloned().collect(),
            deleted_users,
            unchanged: classification.unchanged_count(),
        };

        info!(
            new = plan.new_users.len(),
            outdated = plan.outdated_users.len(),
            deleted = plan.deleted_users.len(),
            unchanged = plan.unchanged,
            "Synchronization plan ready"
        );

        Ok(plan)
    }

    /// Executes the write passes: create, update, delete
    ///
    /// Failures are logged and recorded in the report; one user's failure
    /// never stops the others. Users whose creation fails are marked
    /// invalid in `plan`.
    #[tracing::instrument(skip(self, plan))]
    pub async fn apply(&self, plan: &mut SyncPlan) -> SyncReport {
        let mut report = SyncReport::default();

        self.create_users(&mut plan.new_users, &mut report).await;
        self.update_users(&plan.outdated_users, &mut report).await;
        self.delete_users(&plan.deleted_users, &mut report).await;

        report.duration_ms = (Utc::now() - plan.started_at)
            .num_milliseconds()
            .max(0) as u64;

        info!(
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            failed = report.failed.len(),
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Added {} new users, updated {} existing users, removed {} users",
            report.added,
            report.updated,
            report.removed
        );

        report
    }

    /// Plans and applies in one go
    pub async fn sync(&self) -> Result<SyncReport> {
        let mut plan = self.start().await?;
        Ok(self.apply(&mut plan).await)
    }

    // ------------------------------------------------------------------------
    // Read phases
    // ------------------------------------------------------------------------

    /// Snapshot of every non-frozen destination user with details and roles
    #[tracing::instrument(skip(self))]
    pub async fn refresh_existing_users(&self) -> Result<Vec<User>, SyncError> {
        let summaries = self
            .account_store
            .list_users()
            .await
            .map_err(|err| SyncError::DestinationSnapshot(format!("{err:#}")))?;

        let mut users = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let login = summary.login;
            if self.settings.frozen.contains(&login) {
                debug!(uid = %login, "Skipping frozen destination user");
                continue;
            }

            let details = self.account_store.get_details(&login).await.map_err(|err| {
                SyncError::DestinationSnapshot(format!("details of '{login}': {err:#}"))
            })?;
            let roles = self.account_store.list_roles(&login).await.map_err(|err| {
                SyncError::DestinationSnapshot(format!("roles of '{login}': {err:#}"))
            })?;

            users.push(
                User::new(login)
                    .with_account(details.first_name, details.last_name, details.email)
                    .with_roles(roles),
            );
        }

        debug!(count = users.len(), "Destination snapshot loaded");
        Ok(users)
    }

    /// Users reachable through any mapped role or group, with resolved roles
    ///
    /// Entries without a UID, frozen users and repeated UIDs are dropped.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_staged_users(&self) -> Result<Vec<User>, SyncError> {
        let directory = self.directory.as_ref();
        let member_dns = self.resolver.member_dns(directory).await?;

        let mut seen = BTreeSet::new();
        let mut staged = Vec::new();
        for dn in &member_dns {
            let mut user = staging::user_from_dn(
                directory,
                &self.settings.attributes,
                &self.settings.all_users_base,
                dn,
            )
            .await?;

            if user.validate().is_err() {
                warn!(dn = %dn, "Skipping member without UID");
                continue;
            }
            if self.settings.frozen.contains(user.uid()) {
                debug!(uid = %user, "Skipping frozen member");
                continue;
            }
            if !seen.insert(user.uid().to_string()) {
                warn!(uid = %user, dn = %dn, "UID already staged from another DN");
                continue;
            }

            let roles = self.resolver.roles_for(directory, &user).await?;
            user.add_roles(roles);
            staged.push(user);
        }

        debug!(count = staged.len(), "Staged users loaded");
        Ok(staged)
    }

    /// Every person entry under the all-users base DN, used for removals
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all_directory_users(&self) -> Result<Vec<User>, SyncError> {
        let base_dn = &self.settings.all_users_base;
        let entries = self
            .directory
            .search(base_dn, PERSON_FILTER, &[])
            .await
            .map_err(|err| directory_error(base_dn, err))?;

        let users: Vec<User> = entries
            .iter()
            .map(|entry| staging::user_from_entry(entry, &self.settings.attributes, base_dn))
            .filter(|user| user.validate().is_ok())
            .filter(|user| !self.settings.frozen.contains(user.uid()))
            .collect();

        debug!(count = users.len(), "Directory users loaded");
        Ok(users)
    }

    // ------------------------------------------------------------------------
    // Write passes
    // ------------------------------------------------------------------------

    async fn create_users(&self, users: &mut [User], report: &mut SyncReport) {
        for user in users.iter_mut() {
            let account = NewAccount {
                login: user.uid().to_string(),
                password: String::new(),
                first_name: user.given_name().to_string(),
                last_name: user.family_name().to_string(),
                email: user.email().to_string(),
                use_pam_auth: true,
            };

            match self.account_store.create_user(&account).await {
                Ok(()) => {
                    info!(uid = %user, "User created");
                    report.added += 1;
                    if let Err(err) = self.push_roles(user, report).await {
                        let msg = format!("{err:#}");
                        error!(uid = %user, error = %msg, "Role push failed");
                        report.errors.push(msg);
                    }
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    error!(uid = %user, error = %reason, "Failed to create user");
                    user.mark_invalid(reason.clone());
                    report.failed.push(FailedUser {
                        uid: user.uid().to_string(),
                        reason,
                    });
                }
            }
        }
    }

    async fn update_users(&self, users: &[User], report: &mut SyncReport) {
        for user in users.iter().filter(|u| u.is_valid()) {
            match self.update_user(user, report).await {
                Ok(()) => {
                    info!(
                        uid = %user,
                        account_changed = user.account_changed(),
                        roles_changed = user.roles_changed(),
                        "User updated"
                    );
                    report.updated += 1;
                }
                Err(err) => {
                    let msg = format!("{err:#}");
                    error!(uid = %user, error = %msg, "Failed to update user");
                    report.errors.push(msg);
                }
            }
        }
    }

    /// Roles, then account details, then PAM; stops at the first failure
    async fn update_user(&self, user: &User, report: &mut SyncReport) -> Result<()> {
        let uid = user.uid();
        self.push_roles(user, report).await?;

        let details = AccountDetails {
            first_name: user.given_name().to_string(),
            last_name: user.family_name().to_string(),
            email: user.email().to_string(),
        };
        self.account_store
            .set_details(uid, &details)
            .await
            .with_context(|| format!("Failed to set details of '{uid}'"))?;

        self.account_store
            .use_pam_authentication(uid, true)
            .await
            .with_context(|| format!("Failed to enable PAM authentication for '{uid}'"))?;

        Ok(())
    }

    async fn delete_users(&self, users: &[User], report: &mut SyncReport) {
        for user in users {
            match self.account_store.delete_user(user.uid()).await {
                Ok(()) => {
                    info!(uid = %user, "User removed");
                    report.removed += 1;
                }
                Err(err) => {
                    let msg = format!("Failed to delete '{}': {err:#}", user.uid());
                    error!(uid = %user, error = %msg, "Failed to delete user");
                    report.errors.push(msg);
                }
            }
        }
    }

    /// Replaces the destination role set with the user's directory roles
    ///
    /// Every current role is revoked, then every directory role is granted.
    /// Only a failed listing aborts; single grant/revoke failures are
    /// recorded and the push continues.
    async fn push_roles(&self, user: &User, report: &mut SyncReport) -> Result<()> {
        let uid = user.uid();
        let current = self
            .account_store
            .list_roles(uid)
            .await
            .with_context(|| format!("Failed to list roles of '{uid}'"))?;

        for role in &current {
            if let Err(err) = self.account_store.remove_role(uid, role).await {
                let msg = format!("Failed to remove role '{role}' from '{uid}': {err:#}");
                warn!(%msg);
                report.errors.push(msg);
            }
        }

        for role in user.roles() {
            if let Err(err) = self.account_store.add_role(uid, role).await {
                let msg = format!("Failed to add role '{role}' to '{uid}': {err:#}");
                warn!(%msg);
                report.errors.push(msg);
            }
        }

        debug!(uid, removed = current.len(), added = user.roles().len(), "Roles pushed");
        Ok(())
    }
}
