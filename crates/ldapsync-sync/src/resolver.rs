//! Role resolution
//!
//! A user's destination roles are the union of the roles mapped to every
//! directory object that lists the user's DN in its membership attribute.
//! Organizational roles use `roleOccupant`, groups use `member`.

use std::collections::BTreeSet;

use tracing::debug;

use ldapsync_core::domain::role_source::MEMBERSHIP_ATTRIBUTES;
use ldapsync_core::domain::{RoleSource, User};
use ldapsync_core::ports::{IDirectory, ANY_OBJECT_FILTER};

use crate::SyncError;

/// Resolves destination roles from the configured role sources
#[derive(Debug, Clone, Default)]
pub struct RoleResolver {
    sources: Vec<RoleSource>,
}

impl RoleResolver {
    pub fn new(sources: impl IntoIterator<Item = RoleSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }

    /// Every configured membership DN, roles first, then groups
    pub fn mapped_dns(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().flat_map(RoleSource::dns)
    }

    /// Roles granted to `user` by all sources
    ///
    /// A user without a DN cannot be a member of anything and resolves to
    /// the empty set without querying the directory.
    pub async fn roles_for(
        &self,
        directory: &dyn IDirectory,
        user: &User,
    ) -> Result<BTreeSet<String>, SyncError> {
        let mut roles = BTreeSet::new();
        if user.dn().is_empty() {
            return Ok(roles);
        }

        for source in &self.sources {
            let attribute = source.member_attribute();
            for (dn, mapped) in source.mapping() {
                let entries = directory
                    .search(dn, source.filter(), &[attribute])
                    .await
                    .map_err(|err| directory_error(dn, err))?;

                let is_member = entries
                    .iter()
                    .any(|entry| entry.values(attribute).iter().any(|v| v == user.dn()));

                if is_member {
                    debug!(uid = %user, dn = %dn, kind = %source.kind(), "Membership found");
                    roles.extend(mapped.iter().filter(|r| !r.is_empty()).cloned());
                }
            }
        }

        Ok(roles)
    }

    /// Distinct member DNs listed by the objects under every mapped DN
    ///
    /// Both `member` and `roleOccupant` are collected regardless of the
    /// source kind, so a group configured under `roles` still stages its
    /// members.
    pub async fn member_dns(
        &self,
        directory: &dyn IDirectory,
    ) -> Result<BTreeSet<String>, SyncError> {
        let mut members = BTreeSet::new();

        for dn in self.mapped_dns() {
            let entries = directory
                .search(dn, ANY_OBJECT_FILTER, &MEMBERSHIP_ATTRIBUTES)
                .await
                .map_err(|err| directory_error(dn, err))?;

            for entry in &entries {
                for attribute in MEMBERSHIP_ATTRIBUTES {
                    members.extend(
                        entry
                            .values(attribute)
                            .iter()
                            .filter(|v| !v.is_empty())
                            .cloned(),
                    );
                }
            }
        }

        debug!(count = members.len(), "Collected member DNs");
        Ok(members)
    }
}

pub(crate) fn directory_error(base_dn: &str, err: anyhow::Error) -> SyncError {
    SyncError::Directory {
        base_dn: base_dn.to_string(),
        reason: format!("{err:#}"),
    }
}
