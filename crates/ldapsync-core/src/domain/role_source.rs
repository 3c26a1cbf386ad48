//! Role sources
//!
//! A [`RoleSource`] binds directory objects (organizational roles or
//! groups) to destination role names. Two instances exist per run and
//! both are evaluated for every candidate user; their grants are unioned.

use std::fmt;

use serde::Serialize;

use super::errors::DomainError;

/// Object class filter selecting organizational roles
pub const ROLE_FILTER: &str = "(objectClass=organizationalRole)";

/// Object class filter selecting groups (OpenLDAP and Active Directory)
pub const GROUP_FILTER: &str = "(|(objectClass=groupOfNames)(objectClass=group))";

/// Attribute listing the occupants of an organizational role
pub const ROLE_OCCUPANT_ATTRIBUTE: &str = "roleOccupant";

/// Attribute listing the members of a group
pub const MEMBER_ATTRIBUTE: &str = "member";

/// Every attribute that may carry a user DN on a configured role or group
pub const MEMBERSHIP_ATTRIBUTES: [&str; 2] = [MEMBER_ATTRIBUTE, ROLE_OCCUPANT_ATTRIBUTE];

/// Flavor of a role source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSourceKind {
    /// `organizationalRole` entries, occupants in `roleOccupant`
    OrganizationalRole,
    /// `groupOfNames` / `group` entries, members in `member`
    Group,
}

impl fmt::Display for RoleSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleSourceKind::OrganizationalRole => write!(f, "role"),
            RoleSourceKind::Group => write!(f, "group"),
        }
    }
}

/// A configured rule mapping directory membership to destination roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSource {
    kind: RoleSourceKind,
    filter: String,
    member_attribute: String,
    /// Directory DN -> destination role names, in configuration order
    mapping: Vec<(String, Vec<String>)>,
}

impl RoleSource {
    /// Role source over organizational roles
    pub fn organizational_roles<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            kind: RoleSourceKind::OrganizationalRole,
            filter: ROLE_FILTER.to_string(),
            member_attribute: ROLE_OCCUPANT_ATTRIBUTE.to_string(),
            mapping: mapping.into_iter().collect(),
        }
    }

    /// Role source over groups
    pub fn groups<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            kind: RoleSourceKind::Group,
            filter: GROUP_FILTER.to_string(),
            member_attribute: MEMBER_ATTRIBUTE.to_string(),
            mapping: mapping.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> RoleSourceKind {
        self.kind
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn member_attribute(&self) -> &str {
        &self.member_attribute
    }

    pub fn mapping(&self) -> &[(String, Vec<String>)] {
        &self.mapping
    }

    /// Configured directory DNs
    pub fn dns(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().map(|(dn, _)| dn.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Checks every mapping entry has a DN and at least one non-empty role
    pub fn validate(&self) -> Result<(), DomainError> {
        for (dn, roles) in &self.mapping {
            if dn.trim().is_empty() {
                return Err(DomainError::EmptyMappingDn);
            }
            if roles.is_empty() {
                return Err(DomainError::EmptyMappingRoles(dn.clone()));
            }
            if roles.iter().any(|r| r.trim().is_empty()) {
                return Err(DomainError::EmptyRoleName(dn.clone()));
            }
        }
        Ok(())
    }
}
