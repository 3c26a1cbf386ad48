//! Administrator lockout guard
//!
//! Deleting or demoting the last administrator would leave the destination
//! without anyone able to repair it. Frozen users are never touched by a
//! run, so at least one of them must already hold the administrator role.

use tracing::{debug, error, info};

use ldapsync_core::domain::FrozenSet;
use ldapsync_core::ports::IAccountStore;

use crate::SyncError;

/// Destination role granting organization administration
pub const ADMIN_ROLE: &str = "org_admin";

/// Returns the first frozen UID (in sorted order) holding `admin_role`
///
/// A failed role listing for one frozen user is logged and that user is
/// skipped. The guard only fails when no frozen user qualifies.
#[tracing::instrument(skip(account_store, frozen), fields(frozen_count = frozen.len()))]
pub async fn verify_frozen_administrator(
    account_store: &dyn IAccountStore,
    frozen: &FrozenSet,
    admin_role: &str,
) -> Result<String, SyncError> {
    for uid in frozen.iter() {
        match account_store.list_roles(uid).await {
            Ok(roles) => {
                if roles.iter().any(|role| role == admin_role) {
                    info!(uid, role = admin_role, "Frozen administrator found");
                    return Ok(uid.to_string());
                }
                debug!(uid, ?roles, "Frozen user is not an administrator");
            }
            Err(err) => {
                error!(uid, error = %format!("{err:#}"), "Failed to list roles of frozen user");
            }
        }
    }

    Err(SyncError::LockoutGuard {
        role: admin_role.to_string(),
        checked: frozen.iter().map(str::to_string).collect(),
    })
}
