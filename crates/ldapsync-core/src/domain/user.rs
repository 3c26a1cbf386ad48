//! User domain entity
//!
//! A [`User`] is the canonical identity record shared by both sides of the
//! synchronization. Directory-origin users carry a distinguished name;
//! destination-origin users leave it empty. The two origins are never
//! merged into one instance: the classifier copies field values explicitly
//! with [`User::overwrite_from`].

use std::collections::BTreeSet;

use serde::Serialize;

use super::errors::DomainError;

/// Canonical identity record with its role set and change-tracking flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    /// Login name, the key across directory and destination
    uid: String,
    /// Distinguished name (directory-origin users only)
    #[serde(skip_serializing_if = "String::is_empty")]
    dn: String,
    given_name: String,
    family_name: String,
    email: String,
    /// Destination role names, duplicates collapsed
    roles: BTreeSet<String>,
    /// Not yet present in the destination
    #[serde(skip)]
    new: bool,
    /// Present in the destination but drifted from the directory
    #[serde(skip)]
    outdated: bool,
    #[serde(skip)]
    account_changed: bool,
    #[serde(skip)]
    roles_changed: bool,
    /// Set when a write against the destination failed for this user
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl User {
    /// Creates a user keyed by `uid` with every other field empty
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Creates a directory-origin placeholder that only knows its DN
    ///
    /// Used when a DN does not resolve to exactly one entry; the empty
    /// UID makes the user drop out of the staged set.
    pub fn from_dn(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            ..Self::default()
        }
    }

    /// Checks that the user can take part in synchronization
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.uid.is_empty() {
            return Err(DomainError::EmptyUid);
        }
        Ok(())
    }

    // --- Getters ---

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn is_outdated(&self) -> bool {
        self.outdated
    }

    /// Email or name differs between directory and destination
    pub fn account_changed(&self) -> bool {
        self.account_changed
    }

    /// Role set differs between directory and destination
    pub fn roles_changed(&self) -> bool {
        self.roles_changed
    }

    /// Returns false once a destination write failed for this user
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // --- Setters / State Mutations ---

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.uid = uid.into();
    }

    pub fn set_dn(&mut self, dn: impl Into<String>) {
        self.dn = dn.into();
    }

    pub fn set_given_name(&mut self, name: impl Into<String>) {
        self.given_name = name.into();
    }

    pub fn set_family_name(&mut self, name: impl Into<String>) {
        self.family_name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    /// Builder-style variant of the name and email setters
    pub fn with_account(
        mut self,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.given_name = given_name.into();
        self.family_name = family_name.into();
        self.email = email.into();
        self
    }

    /// Builder-style variant of [`User::add_roles`]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_roles(roles);
        self
    }

    /// Unions `roles` into the role set; empty names are ignored
    pub fn add_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            let role = role.into();
            if !role.is_empty() {
                self.roles.insert(role);
            }
        }
    }

    pub fn flush_roles(&mut self) {
        self.roles.clear();
    }

    pub fn mark_new(&mut self) {
        self.new = true;
    }

    pub fn set_outdated(&mut self, outdated: bool) {
        self.outdated = outdated;
    }

    /// Records a failed destination write; the user is excluded from
    /// further pushes in the same pass
    pub fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
    }

    /// Order-independent role set comparison
    pub fn same_roles(&self, other: &User) -> bool {
        self.roles == other.roles
    }

    /// Compares account fields and roles against `destination`
    ///
    /// Sets the diagnostic flags on `self` and returns true when nothing
    /// drifted. Identity (UID) is not compared.
    pub fn compare_with(&mut self, destination: &User) -> bool {
        self.account_changed = self.email != destination.email
            || self.given_name != destination.given_name
            || self.family_name != destination.family_name;
        self.roles_changed = !self.same_roles(destination);

        !(self.account_changed || self.roles_changed)
    }

    /// Copies account fields, roles and change flags from `source`
    ///
    /// The distinguished name stays untouched so a destination-origin
    /// user never acquires directory identity.
    pub fn overwrite_from(&mut self, source: &User) {
        self.given_name = source.given_name.clone();
        self.family_name = source.family_name.clone();
        self.email = source.email.clone();
        self.roles = source.roles.clone();
        self.outdated = source.outdated;
        self.account_changed = source.account_changed;
        self.roles_changed = source.roles_changed;
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uid)
    }
}
