//! Frozen users
//!
//! UIDs listed here are never created, updated or deleted, whatever the
//! directory or the destination says. At least one of them must hold the
//! administrative role for a run to proceed.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrozenSet {
    uids: BTreeSet<String>,
}

impl FrozenSet {
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uids: uids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}
