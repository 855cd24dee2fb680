use serde::{Deserialize, Serialize};
use std::fmt;

/// Business uniqueness key in the target store.
///
/// Used as a duplicate guard that does not depend on the identity map, so a
/// lost or stale map never leads to a second copy of the same record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKey {
    /// Lowercased email address.
    Email(String),
    /// Lowercased username.
    Username(String),
    /// Username as the user typed it.
    DisplayUsername(String),
    /// Resume slug scoped to its (new) owner.
    Slug { slug: String, user_id: String },
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NaturalKey::Email(email) => write!(f, "email={email}"),
            NaturalKey::Username(name) => write!(f, "username={name}"),
            NaturalKey::DisplayUsername(name) => write!(f, "display_username={name}"),
            NaturalKey::Slug { slug, user_id } => write!(f, "slug={slug},user_id={user_id}"),
        }
    }
}
