use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The legacy marker written in place of an activation key once the key has
/// been used. Deployments may override it through their settings; this is
/// only the conventional default.
pub const CONSUMED_KEY_SENTINEL: &str = "ALREADY_ACTIVATED";

/// The state of a signup's activation key.
///
/// A key moves from `Pending` to `Consumed` exactly once and never back.
/// "Expired" is not a stored state; it is derived from the creation date and
/// the configured activation window on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationState {
    /// An unconsumed activation key awaiting the owner
    Pending {
        /// The opaque key mailed to the signup address
        key: String,
    },
    /// The key was used to activate the account
    Consumed,
}

impl ActivationState {
    pub fn pending<T: Into<String>>(key: T) -> Self {
        Self::Pending { key: key.into() }
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self, ActivationState::Consumed)
    }

    /// The outstanding key, if one exists
    pub fn key(&self) -> Option<&str> {
        match self {
            ActivationState::Pending { key } => Some(key),
            ActivationState::Consumed => None,
        }
    }

    /// The flat string form used by systems that store the state as a single
    /// column with a reserved sentinel for "consumed"
    pub fn as_stored_str<'a>(&'a self, sentinel: &'a str) -> &'a str {
        match self {
            ActivationState::Pending { key } => key,
            ActivationState::Consumed => sentinel,
        }
    }

    /// Inverse of [`Self::as_stored_str`]
    pub fn from_stored(stored: &str, sentinel: &str) -> Self {
        if stored == sentinel {
            ActivationState::Consumed
        } else {
            ActivationState::Pending {
                key: stored.to_string(),
            }
        }
    }
}

/// A pending email change. At most one exists per account; issuing a new
/// change replaces the previous request wholesale, which is what invalidates
/// the previous confirmation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChangeRequest {
    /// The address awaiting confirmation
    pub new_email: String,
    /// The opaque key mailed to `new_email`
    pub confirmation_key: String,
    /// When the request was issued
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_round_trips() {
        let pending = ActivationState::pending("ab12");
        assert_eq!(pending.as_stored_str(CONSUMED_KEY_SENTINEL), "ab12");
        assert_eq!(
            ActivationState::from_stored("ab12", CONSUMED_KEY_SENTINEL),
            pending
        );

        let consumed = ActivationState::Consumed;
        assert_eq!(
            consumed.as_stored_str(CONSUMED_KEY_SENTINEL),
            CONSUMED_KEY_SENTINEL
        );
        assert_eq!(
            ActivationState::from_stored(CONSUMED_KEY_SENTINEL, CONSUMED_KEY_SENTINEL),
            consumed
        );
    }

    #[test]
    fn sentinel_is_honored_even_when_customized() {
        let state = ActivationState::from_stored("DONE", "DONE");
        assert!(state.is_consumed());
        assert_eq!(state.key(), None);
    }
}
