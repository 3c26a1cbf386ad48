//! Directory user construction
//!
//! Turns directory entries into [`User`] records. Attribute names are
//! resolved through the [`AttributeMap`] under the all-users base DN, so
//! deployments with non-standard schemas (e.g. `sAMAccountName` instead of
//! `uid`) only need configuration.

use tracing::{debug, error};

use ldapsync_core::domain::{AttributeMap, User};
use ldapsync_core::ports::{DirectoryEntry, IDirectory};

use crate::resolver::directory_error;
use crate::SyncError;

/// Canonical attribute names looked up through the attribute map
pub const UID_ATTRIBUTE: &str = "uid";
pub const MAIL_ATTRIBUTE: &str = "mail";
pub const NAME_ATTRIBUTE: &str = "name";
pub const GIVEN_NAME_ATTRIBUTE: &str = "givenName";
pub const SURNAME_ATTRIBUTE: &str = "sn";

/// Full name, always read under its literal name
pub const COMMON_NAME_ATTRIBUTE: &str = "cn";

/// Builds a user from one directory entry
///
/// A `cn` made of exactly two space-separated tokens provides given and
/// family name. Otherwise the given name is the first non-empty of the
/// mapped `name` and `givenName`, and the family name is the mapped `sn`.
/// Roles are not resolved here.
pub fn user_from_entry(entry: &DirectoryEntry, attributes: &AttributeMap, base_dn: &str) -> User {
    let attr = |canonical: &'static str| attributes.resolve(base_dn, canonical);

    let mut user = User::from_dn(entry.dn.clone());
    user.set_uid(entry.value(attr(UID_ATTRIBUTE)));
    user.set_email(entry.value(attr(MAIL_ATTRIBUTE)));

    let tokens: Vec<&str> = entry.value(COMMON_NAME_ATTRIBUTE).split(' ').collect();
    if let [given, family] = tokens.as_slice() {
        user.set_given_name(*given);
        user.set_family_name(*family);
    } else {
        user.set_given_name(entry.first_value(&[attr(NAME_ATTRIBUTE), attr(GIVEN_NAME_ATTRIBUTE)]));
        user.set_family_name(entry.value(attr(SURNAME_ATTRIBUTE)));
    }

    user
}

/// Looks up `dn` and builds a user from the single entry found there
///
/// When `dn` does not resolve to exactly one entry (including a DN that no
/// longer exists) the problem is logged and a placeholder holding only the
/// DN is returned; its empty UID keeps it out of every later set. Other
/// lookup failures are fatal.
#[tracing::instrument(skip(directory, attributes))]
pub async fn user_from_dn(
    directory: &dyn IDirectory,
    attributes: &AttributeMap,
    base_dn: &str,
    dn: &str,
) -> Result<User, SyncError> {
    let entries = directory
        .lookup(dn, &[])
        .await
        .map_err(|err| directory_error(dn, err))?;

    match entries.as_slice() {
        [entry] => {
            let user = user_from_entry(entry, attributes, base_dn);
            debug!(uid = %user, "Directory user loaded");
            Ok(user)
        }
        [] => {
            error!(dn, "No directory entry found for member DN");
            Ok(User::from_dn(dn))
        }
        many => {
            error!(dn, count = many.len(), "Member DN matches more than one entry");
            Ok(User::from_dn(dn))
        }
    }
}
