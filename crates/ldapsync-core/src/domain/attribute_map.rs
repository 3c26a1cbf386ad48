//! Per-base-DN attribute remapping
//!
//! Directories do not agree on attribute names (`uid` vs `sAMAccountName`).
//! An [`AttributeMap`] overrides canonical names for a given base DN; any
//! name without an override is used unchanged.

use std::collections::BTreeMap;

/// Base DN -> (canonical attribute name -> directory attribute name)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    overrides: BTreeMap<String, BTreeMap<String, String>>,
}

impl AttributeMap {
    pub fn new(overrides: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { overrides }
    }

    /// Resolves `canonical` for entries queried under `base_dn`
    pub fn resolve<'a>(&'a self, base_dn: &str, canonical: &'a str) -> &'a str {
        self.overrides
            .get(base_dn)
            .and_then(|fields| fields.get(canonical))
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
