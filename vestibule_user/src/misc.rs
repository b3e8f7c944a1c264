//! Miscellaneous Utilities and Error Handling
//!
//! Common error types and record metadata used throughout the vestibule
//! account library.
//!
//! # Important Notes
//!
//! * Error messages are designed to be user-friendly and descriptive
//! * Wrong or stale activation/confirmation keys are NOT errors; the
//!   lifecycle operations report those as `Ok(None)`
//! * Timestamps use ISO 8601/RFC 3339 format when rendered
//!
//! # Related Components
//!
//! * `AccountManager` - Uses error handling and metadata
//! * `PersistenceHandler` - Uses error types

use chrono::{DateTime, Utc};

/// Default Error type for this crate
#[derive(Debug)]
pub enum AccountError {
    /// Input/Output error. Used for possibly failed Serialization/Deserialization of underlying datatypes
    IoError(String),
    /// The account already exists
    AccountExists(u64),
    /// The account does not exist
    AccountNonExists(u64),
    /// The proposed username or full name does not meet the requirements
    InvalidIdentity(String),
    /// The settings passed at construction are unusable
    Misconfigured(String),
    /// An outbound notification could not be delivered
    MailError(String),
    /// Generic error
    Generic(String),
}

impl AccountError {
    pub(crate) fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Generic(msg.into())
    }
    /// Consumes self and returns the underlying error message
    pub fn into_string(self) -> String {
        match self {
            AccountError::IoError(e) => e,
            AccountError::Generic(e) => e,
            AccountError::InvalidIdentity(e) => e,
            AccountError::Misconfigured(e) => e,
            AccountError::MailError(e) => e,
            AccountError::AccountExists(uid) => format!("Account {uid} already exists"),
            AccountError::AccountNonExists(uid) => format!("Account {uid} does not exist"),
        }
    }
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl From<std::io::Error> for AccountError {
    fn from(e: std::io::Error) -> Self {
        AccountError::IoError(format!("{e}"))
    }
}

impl std::error::Error for AccountError {}

/// For passing metadata from a signup account without exposing the record
#[derive(Debug, Clone)]
pub struct AccountMetadata {
    /// User ID
    pub uid: u64,
    /// Username
    pub username: String,
    /// Full name
    pub full_name: String,
    /// Primary email address
    pub email: String,
    /// Whether the account finished activation
    pub active: bool,
    /// Date the account was created
    pub date_joined: DateTime<Utc>,
}

impl PartialEq for AccountMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.username == other.username
            && self.full_name == other.full_name
            && self.email == other.email
    }
}

/// Returns the given timestamp in ISO 8601 format
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}
