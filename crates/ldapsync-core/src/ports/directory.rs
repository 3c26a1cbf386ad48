//! Directory port (driven/secondary port)
//!
//! Read-only access to an LDAP-style directory. Every search is a whole
//! subtree search that never dereferences aliases.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//! - [`DirectoryEntry`] is a port-level DTO; the engine maps it to `User`.

use std::collections::HashMap;

/// Filter matching every entry
pub const ANY_OBJECT_FILTER: &str = "(objectClass=*)";

/// Filter matching person entries under the all-users base DN
pub const PERSON_FILTER: &str = "(objectClass=organizationalPerson)";

/// A single search result with multi-valued attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry
    pub dn: String,
    /// Attribute name -> values, as returned by the server
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder used by adapters and tests to attach attribute values
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// All values of `name`, empty when the attribute is absent
    ///
    /// Attribute names are matched exactly first, then ASCII
    /// case-insensitively.
    pub fn values(&self, name: &str) -> &[String] {
        if let Some(values) = self.attributes.get(name) {
            return values;
        }
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of `name`, or an empty string
    pub fn value(&self, name: &str) -> &str {
        self.values(name).first().map(String::as_str).unwrap_or("")
    }

    /// First non-empty value among `names`, in order
    pub fn first_value(&self, names: &[&str]) -> &str {
        names
            .iter()
            .map(|name| self.value(name))
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }
}

/// Port trait for directory queries
///
/// Implementations keep one bound session open for the whole run.
#[async_trait::async_trait]
pub trait IDirectory: Send + Sync {
    /// Searches the whole subtree rooted at `base_dn`
    ///
    /// # Arguments
    /// * `base_dn` - Search base
    /// * `filter` - RFC 4515 filter string
    /// * `attributes` - Attributes to return; empty means all user attributes
    ///
    /// # Returns
    /// Every matching entry, in server order. A `base_dn` that does not
    /// exist is an error.
    async fn search(
        &self,
        base_dn: &str,
        filter: &str,
        attributes: &[&str],
    ) -> anyhow::Result<Vec<DirectoryEntry>>;

    /// Reads the entries of the subtree rooted at `dn`
    ///
    /// Same as [`IDirectory::search`] with [`ANY_OBJECT_FILTER`], except
    /// that a `dn` which does not exist yields no entries. Used for member
    /// DNs, which may point at entries deleted since the group was written.
    async fn lookup(&self, dn: &str, attributes: &[&str]) -> anyhow::Result<Vec<DirectoryEntry>>;
}
