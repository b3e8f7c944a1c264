use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::account::SignupAccount;
use crate::misc::{AccountError, AccountMetadata};
use crate::profile::{BaseProfile, UserProfile};
use vestibule_types::user;

#[cfg(feature = "filesystem")]
/// Implementation for the filesystem backend
pub mod filesystem_backend;
/// Implementation for an in-memory backend. No durability; data is lost
/// between program executions. Useful for tests and no-fs environments
pub mod memory;

/// Used when constructing the account manager
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(variant_size_differences)]
pub enum BackendType {
    /// Records live in process memory only
    InMemory,
    /// Records are synchronized to the filesystem
    #[cfg(feature = "filesystem")]
    Filesystem(String),
}

impl BackendType {
    /// Creates a new [`BackendType`] given the provided `url`. Returns an
    /// error if the URL could not be parsed
    pub fn new<T: Into<String>>(url: T) -> Result<Self, AccountError> {
        let addr = url.into();
        if addr == "memory" {
            return Ok(BackendType::InMemory);
        }

        #[cfg(feature = "filesystem")]
        {
            if addr.starts_with("file:") {
                return Ok(Self::filesystem(addr));
            }
        }

        Err(AccountError::msg(format!(
            "The addr '{addr}' is not a valid target (hint: use 'memory', or a 'file:' path with the 'filesystem' feature enabled)"
        )))
    }

    #[cfg(feature = "filesystem")]
    /// For requesting the use of the local filesystem as a backend.
    /// URL format: file:/path/to/directory (unix) or file:C\windows\dir (windows)
    pub fn filesystem<T: Into<String>>(path: T) -> Self {
        Self::Filesystem(path.into().replace("file:", ""))
    }
}

/// An interface for synchronizing account and profile records to a
/// differing target
#[async_trait]
pub trait BackendConnection<P: UserProfile = BaseProfile>: Send + Sync {
    /// This should be run for handling any types of underlying connect operations
    async fn connect(&mut self) -> Result<(), AccountError>;
    /// Determines if connected or not
    async fn is_connected(&self) -> Result<bool, AccountError>;
    /// Saves the entire account record to the backend
    async fn save_account(&self, account: &SignupAccount) -> Result<(), AccountError>;
    /// Find an account by uid
    async fn get_account_by_uid(&self, uid: u64) -> Result<Option<SignupAccount>, AccountError>;
    /// Gets the account by username
    async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<SignupAccount>, AccountError> {
        self.get_account_by_uid(user::username_to_uid(username))
            .await
    }
    /// Determines if a UID is registered
    async fn uid_is_registered(&self, uid: u64) -> Result<bool, AccountError>;
    /// Determines if a username exists
    async fn username_exists(&self, username: &str) -> Result<bool, AccountError> {
        self.uid_is_registered(user::username_to_uid(username))
            .await
    }
    /// Removes an account by uid
    async fn delete_account_by_uid(&self, uid: u64) -> Result<(), AccountError>;
    /// Removes all accounts and profiles. Returns the number of accounts removed
    async fn purge(&self) -> Result<usize, AccountError>;
    /// Returns the uids of every stored account
    async fn get_registered_uids(&self, limit: Option<i32>) -> Result<Vec<u64>, AccountError>;
    /// Gets the username by UID
    async fn get_username_by_uid(&self, uid: u64) -> Result<Option<String>, AccountError>;
    /// Gets the UID by username
    fn get_uid_by_username(&self, username: &str) -> u64 {
        user::username_to_uid(username)
    }
    /// Returns the metadata for an account
    async fn get_account_metadata(
        &self,
        uid: u64,
    ) -> Result<Option<AccountMetadata>, AccountError>;
    /// Gets all the metadata for many accounts
    async fn get_accounts_metadata(
        &self,
        limit: Option<i32>,
    ) -> Result<Vec<AccountMetadata>, AccountError>;
    /// Returns full account records, for the lifecycle sweeps
    async fn get_accounts(&self, limit: Option<i32>) -> Result<Vec<SignupAccount>, AccountError>;
    /// Saves the entire profile record to the backend
    async fn save_profile(&self, profile: &P) -> Result<(), AccountError>;
    /// Find a profile by the owning uid
    async fn get_profile_by_uid(&self, uid: u64) -> Result<Option<P>, AccountError>;
    /// Returns full profile records
    async fn get_profiles(&self, limit: Option<i32>) -> Result<Vec<P>, AccountError>;
    /// Removes a profile by the owning uid. Removing an absent profile is a no-op
    async fn delete_profile_by_uid(&self, uid: u64) -> Result<(), AccountError>;
}

/// This is what every record consumer gets. This gets called before making I/O operations
pub struct PersistenceHandler<P: UserProfile = BaseProfile> {
    inner: Arc<dyn BackendConnection<P>>,
}

impl<P: UserProfile> PersistenceHandler<P> {
    /// Creates a new persistence handler, connecting to the backend then
    /// returning self
    pub async fn create<T: BackendConnection<P> + 'static>(
        mut inner: T,
    ) -> Result<Self, AccountError> {
        inner.connect().await?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

impl<P: UserProfile> Deref for PersistenceHandler<P> {
    type Target = Arc<dyn BackendConnection<P>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<P: UserProfile> Clone for PersistenceHandler<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
