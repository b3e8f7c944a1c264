//! # Signup Account Records
//!
//! The stored record backing a user's signup: identity fields, the
//! activation key, and any in-flight email change. The record is plain
//! data; persistence always goes through an explicit
//! [`PersistenceHandler`](crate::backend::PersistenceHandler) save, and the
//! state transitions here are pure functions of the record plus a supplied
//! timestamp.
//!
//! ## Important Notes
//!
//! * The activation key moves from pending to consumed exactly once and
//!   never back
//! * "Expired" is computed on every check, never stored
//! * At most one email change is pending; re-issuing replaces it

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::NewAccount;
use crate::misc::{AccountError, AccountMetadata};
use vestibule_types::account::{ActivationState, EmailChangeRequest};
use vestibule_types::user::username_to_uid;

/// One record per user identity, created at signup.
///
/// SAFETY: The `uid` and `username` are private. These values should NEVER
/// be edited after construction; every lookup key in the backends derives
/// from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupAccount {
    /// Derived from the username; the storage key for this record
    uid: u64,
    username: String,
    pub full_name: String,
    /// The confirmed primary address. Only `confirm_email_change` replaces it.
    pub email: String,
    /// Whether activation completed
    pub active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
    /// The activation key, or the consumed marker
    pub activation: ActivationState,
    /// Set once by the reminder sweep so nobody is nagged twice
    pub activation_notice_sent: bool,
    /// The in-flight email change, if any
    pub pending_email: Option<EmailChangeRequest>,
}

impl SignupAccount {
    /// Builds the record for a fresh signup. The caller provides the
    /// already-generated activation key and the creation timestamp.
    pub fn new(
        identity: NewAccount,
        activation_key: String,
        now: DateTime<Utc>,
    ) -> Result<Self, AccountError> {
        if identity.username.is_empty() {
            return Err(AccountError::InvalidIdentity(
                "Cannot create an account without a username".to_string(),
            ));
        }

        let uid = username_to_uid(&identity.username);
        log::trace!(target: "vestibule", "Creating signup account w/uid: {uid:?}");

        Ok(Self {
            uid,
            username: identity.username,
            full_name: identity.full_name,
            email: identity.email,
            active: false,
            date_joined: now,
            last_active: None,
            activation: ActivationState::pending(activation_key),
            activation_notice_sent: false,
            pending_email: None,
        })
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks if the activation key is expired.
    ///
    /// Returns `true` when the key was already consumed, regardless of
    /// elapsed time, or when `now` reached the end of the activation window
    /// counted from `date_joined`. Pure; storage is untouched.
    pub fn is_activation_expired(&self, now: DateTime<Utc>, window_days: u32) -> bool {
        if self.activation.is_consumed() {
            return true;
        }
        let expiration_date = self.date_joined + Duration::days(i64::from(window_days));
        now >= expiration_date
    }

    /// Consumes the activation key if `key` matches the outstanding one.
    /// Returns whether the account was activated. Expiry is the caller's
    /// check; a consumed key never matches again.
    pub fn activate(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        match self.activation.key() {
            Some(pending) if pending == key => {
                self.activation = ActivationState::Consumed;
                self.active = true;
                self.last_active = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Replaces any pending email change with a new request. Last write
    /// wins; the previous confirmation key stops matching by virtue of the
    /// overwrite.
    pub fn begin_email_change(&mut self, new_email: String, confirmation_key: String, now: DateTime<Utc>) {
        self.pending_email = Some(EmailChangeRequest {
            new_email,
            confirmation_key,
            issued_at: now,
        });
    }

    /// Applies the pending change if `key` matches its confirmation key.
    /// On a match the primary email is replaced and the pending state
    /// cleared. Returns whether anything was applied.
    pub fn confirm_email_change(&mut self, key: &str) -> bool {
        match self.pending_email.take() {
            Some(pending) if pending.confirmation_key == key => {
                self.email = pending.new_email;
                true
            }
            not_matched => {
                self.pending_email = not_matched;
                false
            }
        }
    }

    pub fn metadata(&self) -> AccountMetadata {
        AccountMetadata {
            uid: self.uid,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            active: self.active,
            date_joined: self.date_joined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn account() -> SignupAccount {
        SignupAccount::new(
            NewAccount::new("alice", "Alice Doe", "alice@example.com"),
            "key-one".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn expiry_window_is_counted_from_date_joined() {
        let account = account();
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap();
        assert!(!account.is_activation_expired(day(2), 2));
        assert!(account.is_activation_expired(day(3), 2));
        assert!(account.is_activation_expired(day(25), 2));
    }

    #[test]
    fn consumed_keys_are_expired_immediately() {
        let mut account = account();
        let now = account.date_joined;
        assert!(account.activate("key-one", now));
        assert!(account.is_activation_expired(now, 2));
        // and the key never matches again
        assert!(!account.activate("key-one", now));
        assert!(account.activation.is_consumed());
    }

    #[test]
    fn wrong_key_does_not_activate() {
        let mut account = account();
        let now = account.date_joined;
        assert!(!account.activate("other-key", now));
        assert!(!account.active);
        assert!(!account.activation.is_consumed());
    }

    #[test]
    fn reissued_change_invalidates_the_previous_key() {
        let mut account = account();
        let now = account.date_joined;
        account.begin_email_change("new@x.com".to_string(), "k1".to_string(), now);
        account.begin_email_change("newer@x.com".to_string(), "k2".to_string(), now);

        assert!(!account.confirm_email_change("k1"));
        assert_eq!(account.email, "alice@example.com");

        assert!(account.confirm_email_change("k2"));
        assert_eq!(account.email, "newer@x.com");
        assert!(account.pending_email.is_none());
    }
}
