//! Extension trait driving account and profile lookups straight off a
//! [`UserIdentifier`], so call sites can search with whichever handle they
//! hold (uid or username).

use crate::account::SignupAccount;
use crate::account_manager::AccountManager;
use crate::misc::AccountError;
use crate::profile::BaseProfile;
use async_trait::async_trait;
use vestibule_types::user::UserIdentifier;

#[async_trait]
pub trait UserIdentifierExt {
    type AccountManager;
    type SearchOutput;
    type Error;
    async fn search(
        &self,
        account_manager: &Self::AccountManager,
    ) -> Result<Option<Self::SearchOutput>, Self::Error>;

    /// Performs a search for this user's profile
    async fn search_profile(
        &self,
        account_manager: &Self::AccountManager,
    ) -> Result<Option<BaseProfile>, Self::Error>;

    fn get_uid(&self) -> u64;
}

#[async_trait]
impl UserIdentifierExt for UserIdentifier {
    type AccountManager = AccountManager;
    type SearchOutput = SignupAccount;
    type Error = AccountError;

    /// Searches for the account
    async fn search(
        &self,
        account_manager: &AccountManager,
    ) -> Result<Option<SignupAccount>, AccountError> {
        account_manager.get_account(self.clone()).await
    }

    /// Searches for the profile belonging to this user
    async fn search_profile(
        &self,
        account_manager: &AccountManager,
    ) -> Result<Option<BaseProfile>, AccountError> {
        account_manager.get_profile(self.clone()).await
    }

    /// Gets the UID of this target
    fn get_uid(&self) -> u64 {
        self.uid()
    }
}
