//! # Filesystem Backend
//!
//! Persistent storage for accounts and profiles using the local filesystem,
//! with the in-memory backend in front as a cache. One bincode file per
//! record; the directory layout is owned by
//! [`DirectoryStore`](crate::directory_store::DirectoryStore).
//!
//! ## Important Notes
//!
//! * `connect` creates the directory tree and loads every stored record
//!   into the cache, so reads after startup never touch the disk
//! * Corrupt record files are skipped (and logged) at load time rather than
//!   failing the whole backend

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::account::SignupAccount;
use crate::backend::memory::MemoryBackend;
use crate::backend::BackendConnection;
use crate::directory_store::{setup_directories, BasePath, DirectoryStore};
use crate::misc::{AccountError, AccountMetadata};
use crate::profile::UserProfile;
use crate::record_loader::{
    load_account_files, load_profile_files, ACCOUNT_SERIALIZED_EXTENSION,
    PROFILE_SERIALIZED_EXTENSION,
};
use crate::serialization::SyncIO;

/// Stores each record as a bincode file while keeping the memory backend
/// synchronized for fast access
pub struct FilesystemBackend<P: UserProfile> {
    memory_backend: MemoryBackend<P>,
    directory_store: Option<DirectoryStore>,
    home_dir: String,
}

impl<P: UserProfile> From<String> for FilesystemBackend<P> {
    fn from(home_dir: String) -> Self {
        Self {
            home_dir,
            memory_backend: MemoryBackend::default(),
            directory_store: None,
        }
    }
}

impl<P: UserProfile> FilesystemBackend<P> {
    fn store(&self) -> Result<&DirectoryStore, AccountError> {
        self.directory_store
            .as_ref()
            .ok_or_else(|| AccountError::msg("The filesystem backend is not connected"))
    }

    fn account_path(&self, uid: u64) -> Result<PathBuf, AccountError> {
        Ok(self.store()?.make_path(
            BasePath::AccountDir,
            format!("{uid}.{ACCOUNT_SERIALIZED_EXTENSION}"),
        ))
    }

    fn profile_path(&self, uid: u64) -> Result<PathBuf, AccountError> {
        Ok(self.store()?.make_path(
            BasePath::ProfileDir,
            format!("{uid}.{PROFILE_SERIALIZED_EXTENSION}"),
        ))
    }
}

#[async_trait]
impl<P: UserProfile> BackendConnection<P> for FilesystemBackend<P> {
    async fn connect(&mut self) -> Result<(), AccountError> {
        let directory_store = setup_directories(self.home_dir.clone())?;
        let accounts = load_account_files(&directory_store)?;
        let profiles: HashMap<u64, P> = load_profile_files(&directory_store)?;
        // ensure the in-memory database has the records loaded
        *self.memory_backend.accounts.get_mut() = accounts;
        *self.memory_backend.profiles.get_mut() = profiles;
        self.directory_store = Some(directory_store);

        Ok(())
    }

    async fn is_connected(&self) -> Result<bool, AccountError> {
        Ok(self.directory_store.is_some())
    }

    async fn save_account(&self, account: &SignupAccount) -> Result<(), AccountError> {
        // save to filesystem, then, synchronize to memory
        let bytes = account.serialize_to_vector()?;
        let path = self.account_path(account.uid())?;
        std::fs::write(path, bytes).map_err(|err| AccountError::Generic(err.to_string()))?;
        self.memory_backend.save_account(account).await
    }

    async fn get_account_by_uid(&self, uid: u64) -> Result<Option<SignupAccount>, AccountError> {
        self.memory_backend.get_account_by_uid(uid).await
    }

    async fn uid_is_registered(&self, uid: u64) -> Result<bool, AccountError> {
        self.memory_backend.uid_is_registered(uid).await
    }

    async fn delete_account_by_uid(&self, uid: u64) -> Result<(), AccountError> {
        self.memory_backend.delete_account_by_uid(uid).await?;
        let path = self.account_path(uid)?;
        std::fs::remove_file(path).map_err(|err| AccountError::Generic(err.to_string()))
    }

    async fn purge(&self) -> Result<usize, AccountError> {
        let account_paths = {
            let mut write = self.memory_backend.accounts.write();
            write
                .drain()
                .map(|(uid, _account)| self.account_path(uid))
                .collect::<Result<Vec<PathBuf>, AccountError>>()?
        };
        let profile_paths = {
            let mut write = self.memory_backend.profiles.write();
            write
                .drain()
                .map(|(uid, _profile)| self.profile_path(uid))
                .collect::<Result<Vec<PathBuf>, AccountError>>()?
        };

        let count = account_paths.len();

        for path in account_paths.into_iter().chain(profile_paths) {
            tokio::fs::remove_file(path)
                .await
                .map_err(|err| AccountError::Generic(err.to_string()))?;
        }

        // delete the home directory
        let home_dir = self.store()?.home.as_str();
        tokio::fs::remove_dir_all(home_dir)
            .await
            .map_err(|err| AccountError::Generic(err.to_string()))?;

        Ok(count)
    }

    async fn get_registered_uids(&self, limit: Option<i32>) -> Result<Vec<u64>, AccountError> {
        self.memory_backend.get_registered_uids(limit).await
    }

    async fn get_username_by_uid(&self, uid: u64) -> Result<Option<String>, AccountError> {
        self.memory_backend.get_username_by_uid(uid).await
    }

    async fn get_account_metadata(
        &self,
        uid: u64,
    ) -> Result<Option<AccountMetadata>, AccountError> {
        self.memory_backend.get_account_metadata(uid).await
    }

    async fn get_accounts_metadata(
        &self,
        limit: Option<i32>,
    ) -> Result<Vec<AccountMetadata>, AccountError> {
        self.memory_backend.get_accounts_metadata(limit).await
    }

    async fn get_accounts(&self, limit: Option<i32>) -> Result<Vec<SignupAccount>, AccountError> {
        self.memory_backend.get_accounts(limit).await
    }

    async fn save_profile(&self, profile: &P) -> Result<(), AccountError> {
        let bytes = profile.serialize_to_vector()?;
        let path = self.profile_path(profile.base().uid())?;
        std::fs::write(path, bytes).map_err(|err| AccountError::Generic(err.to_string()))?;
        self.memory_backend.save_profile(profile).await
    }

    async fn get_profile_by_uid(&self, uid: u64) -> Result<Option<P>, AccountError> {
        self.memory_backend.get_profile_by_uid(uid).await
    }

    async fn get_profiles(&self, limit: Option<i32>) -> Result<Vec<P>, AccountError> {
        self.memory_backend.get_profiles(limit).await
    }

    async fn delete_profile_by_uid(&self, uid: u64) -> Result<(), AccountError> {
        let existed = self
            .memory_backend
            .get_profile_by_uid(uid)
            .await?
            .is_some();
        self.memory_backend.delete_profile_by_uid(uid).await?;
        if existed {
            let path = self.profile_path(uid)?;
            std::fs::remove_file(path).map_err(|err| AccountError::Generic(err.to_string()))?;
        }
        Ok(())
    }
}
