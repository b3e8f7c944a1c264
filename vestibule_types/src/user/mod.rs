use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use uuid::Uuid;

/// Generates a UID given a username
pub fn username_to_uid(username: &str) -> u64 {
    let mut hasher = twox_hash::XxHash64::default();
    hasher.write(username.as_bytes());
    hasher.finish()
}

/// A convenience wrapper for passing arguments to functions that require searches for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserIdentifier {
    /// Raw user ID
    ID(u64),
    /// Username connected by an unspecified ID
    Username(String),
}

impl UserIdentifier {
    /// Resolves the UID this identifier points at
    pub fn uid(&self) -> u64 {
        match self {
            UserIdentifier::ID(uid) => *uid,
            UserIdentifier::Username(username) => username_to_uid(username),
        }
    }
}

impl From<String> for UserIdentifier {
    fn from(username: String) -> Self {
        Self::Username(username)
    }
}

impl From<&str> for UserIdentifier {
    fn from(username: &str) -> Self {
        Self::Username(username.to_string())
    }
}

impl From<u64> for UserIdentifier {
    fn from(uid: u64) -> Self {
        Self::ID(uid)
    }
}

impl From<Uuid> for UserIdentifier {
    fn from(uuid: Uuid) -> Self {
        Self::Username(uuid.to_string())
    }
}

/// The identity on whose behalf a profile view is attempted. The original
/// distinction between an anonymous visitor and a signed-in user determines
/// the `Registered` privacy tier; `admin` marks identities that implicitly
/// hold every grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Viewer {
    /// A visitor without a session
    Anonymous,
    /// A signed-in user
    User {
        /// UID of the signed-in user
        uid: u64,
        /// Whether this identity bypasses per-object grants
        admin: bool,
    },
}

impl Viewer {
    /// A non-admin signed-in viewer
    pub fn registered(uid: u64) -> Self {
        Self::User { uid, admin: false }
    }

    /// A superuser viewer
    pub fn admin(uid: u64) -> Self {
        Self::User { uid, admin: true }
    }

    /// Whether this viewer carries any authenticated identity
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User { .. })
    }

    /// The UID, if authenticated
    pub fn uid(&self) -> Option<u64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User { uid, .. } => Some(*uid),
        }
    }
}
