use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::account::SignupAccount;
use crate::backend::BackendConnection;
use crate::misc::{AccountError, AccountMetadata};
use crate::profile::{BaseProfile, UserProfile};

/// Keeps every record in process memory. The filesystem backend layers on
/// top of this for its cache, which is why the maps are crate-visible.
pub struct MemoryBackend<P: UserProfile = BaseProfile> {
    pub(crate) accounts: RwLock<HashMap<u64, SignupAccount>>,
    pub(crate) profiles: RwLock<HashMap<u64, P>>,
}

impl<P: UserProfile> Default for MemoryBackend<P> {
    fn default() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
        }
    }
}

fn maybe_limited<T>(items: impl Iterator<Item = T>, limit: Option<i32>) -> Vec<T> {
    match limit {
        Some(limit) => items.take(limit as usize).collect(),
        None => items.collect(),
    }
}

#[async_trait]
impl<P: UserProfile> BackendConnection<P> for MemoryBackend<P> {
    async fn connect(&mut self) -> Result<(), AccountError> {
        Ok(())
    }

    async fn is_connected(&self) -> Result<bool, AccountError> {
        Ok(true)
    }

    async fn save_account(&self, account: &SignupAccount) -> Result<(), AccountError> {
        let _ = self
            .accounts
            .write()
            .insert(account.uid(), account.clone());
        Ok(())
    }

    async fn get_account_by_uid(&self, uid: u64) -> Result<Option<SignupAccount>, AccountError> {
        Ok(self.accounts.read().get(&uid).cloned())
    }

    async fn uid_is_registered(&self, uid: u64) -> Result<bool, AccountError> {
        Ok(self.accounts.read().contains_key(&uid))
    }

    async fn delete_account_by_uid(&self, uid: u64) -> Result<(), AccountError> {
        self.accounts
            .write()
            .remove(&uid)
            .map(|_| ())
            .ok_or(AccountError::AccountNonExists(uid))
    }

    async fn purge(&self) -> Result<usize, AccountError> {
        let count = {
            let mut accounts = self.accounts.write();
            let count = accounts.len();
            accounts.clear();
            count
        };
        self.profiles.write().clear();
        Ok(count)
    }

    async fn get_registered_uids(&self, limit: Option<i32>) -> Result<Vec<u64>, AccountError> {
        Ok(maybe_limited(self.accounts.read().keys().copied(), limit))
    }

    async fn get_username_by_uid(&self, uid: u64) -> Result<Option<String>, AccountError> {
        Ok(self
            .accounts
            .read()
            .get(&uid)
            .map(|account| account.username().to_string()))
    }

    async fn get_account_metadata(
        &self,
        uid: u64,
    ) -> Result<Option<AccountMetadata>, AccountError> {
        Ok(self
            .accounts
            .read()
            .get(&uid)
            .map(|account| account.metadata()))
    }

    async fn get_accounts_metadata(
        &self,
        limit: Option<i32>,
    ) -> Result<Vec<AccountMetadata>, AccountError> {
        Ok(maybe_limited(
            self.accounts.read().values().map(|account| account.metadata()),
            limit,
        ))
    }

    async fn get_accounts(&self, limit: Option<i32>) -> Result<Vec<SignupAccount>, AccountError> {
        Ok(maybe_limited(self.accounts.read().values().cloned(), limit))
    }

    async fn save_profile(&self, profile: &P) -> Result<(), AccountError> {
        let _ = self
            .profiles
            .write()
            .insert(profile.base().uid(), profile.clone());
        Ok(())
    }

    async fn get_profile_by_uid(&self, uid: u64) -> Result<Option<P>, AccountError> {
        Ok(self.profiles.read().get(&uid).cloned())
    }

    async fn get_profiles(&self, limit: Option<i32>) -> Result<Vec<P>, AccountError> {
        Ok(maybe_limited(self.profiles.read().values().cloned(), limit))
    }

    async fn delete_profile_by_uid(&self, uid: u64) -> Result<(), AccountError> {
        let _ = self.profiles.write().remove(&uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::NewAccount;
    use chrono::Utc;

    fn account(username: &str) -> SignupAccount {
        SignupAccount::new(
            NewAccount::new(username, "Test User", "test@example.com"),
            "key".to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let backend = MemoryBackend::<BaseProfile>::default();
        let mut record = account("alice");
        backend.save_account(&record).await.unwrap();

        record.full_name = "Alice Renamed".to_string();
        backend.save_account(&record).await.unwrap();

        let loaded = backend
            .get_account_by_uid(record.uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.full_name, "Alice Renamed");
        assert_eq!(backend.get_accounts(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn username_lookups_use_the_derived_uid() {
        let backend = MemoryBackend::<BaseProfile>::default();
        let record = account("bob");
        backend.save_account(&record).await.unwrap();

        assert!(backend.username_exists("bob").await.unwrap());
        assert!(!backend.username_exists("alice").await.unwrap());
        let loaded = backend.get_account_by_username("bob").await.unwrap();
        assert_eq!(loaded.map(|a| a.uid()), Some(record.uid()));
    }

    #[tokio::test]
    async fn deleting_a_missing_account_is_an_error() {
        let backend = MemoryBackend::<BaseProfile>::default();
        assert!(matches!(
            backend.delete_account_by_uid(1234).await,
            Err(AccountError::AccountNonExists(1234))
        ));
        // profiles are different: absent is a no-op
        backend.delete_profile_by_uid(1234).await.unwrap();
    }

    #[tokio::test]
    async fn purge_empties_both_maps() {
        let backend = MemoryBackend::<BaseProfile>::default();
        let record = account("carol");
        backend.save_account(&record).await.unwrap();
        backend
            .save_profile(&BaseProfile::new(record.uid(), Default::default()))
            .await
            .unwrap();

        assert_eq!(backend.purge().await.unwrap(), 1);
        assert!(backend.get_accounts(None).await.unwrap().is_empty());
        assert!(backend.get_profiles(None).await.unwrap().is_empty());
    }
}
