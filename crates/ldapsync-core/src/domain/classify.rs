//! Classification of directory users against the destination
//!
//! The destination snapshot is rebuilt every run into a keyed map
//! (UID -> [`User`]). Each staged directory user is merged into that map:
//! unknown UIDs are queued as new copies, known UIDs are compared field by
//! field and the destination entry is overwritten with the directory
//! values so the push passes operate on consistent data.

use std::collections::{BTreeMap, BTreeSet};

use super::user::User;

/// Destination users keyed by UID, carrying new/outdated flags
#[derive(Debug, Clone, Default)]
pub struct Classification {
    users: BTreeMap<String, User>,
}

impl Classification {
    /// Merges `staged` directory users into the `existing` destination users
    ///
    /// Flags are set on both sides: the staged users learn whether they are
    /// new or outdated, the returned map holds destination users
    /// overwritten with directory values plus copies of the new users.
    pub fn classify(staged: &mut [User], existing: Vec<User>) -> Self {
        let mut users: BTreeMap<String, User> = existing
            .into_iter()
            .map(|user| (user.uid().to_string(), user))
            .collect();

        for directory_user in staged.iter_mut() {
            match users.get_mut(directory_user.uid()) {
                Some(destination_user) => {
                    let same = directory_user.compare_with(destination_user);
                    directory_user.set_outdated(!same);
                    destination_user.overwrite_from(directory_user);
                }
                None => {
                    directory_user.mark_new();
                    users.insert(directory_user.uid().to_string(), directory_user.clone());
                }
            }
        }

        Self { users }
    }

    pub fn get(&self, uid: &str) -> Option<&User> {
        self.users.get(uid)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.users.contains_key(uid)
    }

    /// All users, ordered by UID
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users that must be created in the destination
    pub fn new_users(&self) -> Vec<&User> {
        self.users.values().filter(|u| u.is_new()).collect()
    }

    /// Existing destination users whose data drifted from the directory
    pub fn outdated_users(&self) -> Vec<&User> {
        self.users
            .values()
            .filter(|u| !u.is_new() && u.is_outdated())
            .collect()
    }

    /// Existing destination users already in agreement with the directory
    pub fn unchanged_count(&self) -> usize {
        self.users
            .values()
            .filter(|u| !u.is_new() && !u.is_outdated())
            .count()
    }

    /// Users to remove from the destination
    ///
    /// A user is deleted when it is part of the full directory set and of
    /// the destination, but no longer part of the staged set. Destination
    /// accounts unknown to the directory are left alone.
    pub fn deleted(&self, all_directory_users: &[User], staged: &[User]) -> Vec<User> {
        let staged_uids: BTreeSet<&str> = staged.iter().map(User::uid).collect();
        let mut seen = BTreeSet::new();

        all_directory_users
            .iter()
            .filter(|user| !user.uid().is_empty())
            .filter(|user| !staged_uids.contains(user.uid()))
            .filter(|user| self.contains(user.uid()))
            .filter(|user| seen.insert(user.uid().to_string()))
            .cloned()
            .collect()
    }
}
