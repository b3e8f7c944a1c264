//! # Account Manager
//!
//! The facade for the whole account lifecycle: signup, activation-key
//! expiry and consumption, email-change confirmation, the reminder sweep,
//! and profile visibility. It provides a unified interface over the storage
//! backends and the mail, clock, secret, and permission collaborators.
//!
//! ## Features
//!
//! * **Signup**
//!   - Identity sanitation and requirements checks
//!   - Activation-key issuance and the activation email
//!   - Profile creation with the configured default privacy
//!
//! * **Lifecycle**
//!   - Expiry checks for activation keys
//!   - Email-change issuance and confirmation
//!   - One-shot expiry reminders and purging of stale signups
//!
//! ## Important Notes
//!
//! * The manager persists a record BEFORE attempting the notification
//!   sends that announce it; a failed send never rolls the record back
//! * Wrong or stale keys are reported as `Ok(None)`, never as errors
//! * The manager must be initialized with a reachable backend; connectivity
//!   is verified during construction
//!
//! ## Related Components
//!
//! * `SignupAccount` - The per-user lifecycle record
//! * `PersistenceHandler` - Backend storage interface
//! * `VisibilityEvaluator` - Profile privacy decisions
//! * `AccountSettings` - Construction-time configuration

use std::sync::Arc;

use chrono::Duration;

use crate::account::SignupAccount;
use crate::backend::memory::MemoryBackend;
use crate::backend::{BackendType, PersistenceHandler};
use crate::clock::{Clock, SystemClock};
use crate::identity::NewAccount;
use crate::mailer::Mailer;
use crate::misc::{AccountError, AccountMetadata};
use crate::permissions::{GrantRegistry, MemoryGrantRegistry};
use crate::profile::{BaseProfile, UserProfile};
use crate::secrets::{RandomSecretSource, SecretSource};
use crate::settings::AccountSettings;
use crate::templates::{self, MailContext};
use crate::visibility::VisibilityEvaluator;
use vestibule_types::profile::GrantKind;
use vestibule_types::user::{UserIdentifier, Viewer};

/// The default manager for the accounts stored on this node. It owns the
/// signup lifecycle and is used especially for when creating a new user via
/// the registration flow.
#[derive(Clone)]
pub struct AccountManager<P: UserProfile = BaseProfile> {
    persistence_handler: PersistenceHandler<P>,
    mailer: Arc<dyn Mailer>,
    grants: Arc<dyn GrantRegistry>,
    visibility: VisibilityEvaluator,
    clock: Arc<dyn Clock>,
    secrets: Arc<dyn SecretSource>,
    settings: AccountSettings,
    backend_ty: BackendType,
}

impl<P: UserProfile> AccountManager<P> {
    /// `backend_type`: where the records live.
    /// `mailer`: the transport every lifecycle notification goes through.
    /// `settings`: validated here; a missing sender address or site domain
    /// fails construction.
    /// `grants`: the permission registry; defaults to the in-process one.
    #[allow(unused_results)]
    pub async fn new(
        backend_type: BackendType,
        mailer: Arc<dyn Mailer>,
        settings: Option<AccountSettings>,
        grants: Option<Arc<dyn GrantRegistry>>,
    ) -> Result<Self, AccountError> {
        let settings = settings.unwrap_or_default();
        settings.validate()?;

        let persistence_handler = match &backend_type {
            BackendType::InMemory => {
                let backend = MemoryBackend::default();
                PersistenceHandler::create(backend).await?
            }

            #[cfg(feature = "filesystem")]
            BackendType::Filesystem(dir) => {
                use crate::backend::filesystem_backend::FilesystemBackend;
                let backend = FilesystemBackend::from(dir.clone());
                PersistenceHandler::create(backend).await?
            }
        };

        if !persistence_handler.is_connected().await? {
            return Err(AccountError::msg(
                "Unable to connect to the backend via account manager",
            ));
        }

        log::info!(target: "vestibule", "Successfully established connection to backend {:?}...", backend_type);

        let grants = grants.unwrap_or_else(|| Arc::new(MemoryGrantRegistry::default()));

        Ok(Self {
            backend_ty: backend_type,
            persistence_handler,
            mailer,
            visibility: VisibilityEvaluator::new(grants.clone()),
            grants,
            clock: Arc::new(SystemClock),
            secrets: Arc::new(RandomSecretSource),
            settings,
        })
    }

    /// Replaces the wall clock. Intended for tests and simulations.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the key generator. Intended for tests.
    pub fn with_secret_source(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Creates the signup record and its profile for a new user.
    ///
    /// The username and full name are trimmed and checked against the
    /// configured requirements; the email address is assumed to be
    /// validated by the caller. A fresh activation key is generated, the
    /// owner receives the standard grants on their own profile, and when
    /// `send_email` is set the activation email goes out after the records
    /// are durable.
    pub async fn create_account(
        &self,
        new_account: NewAccount,
        send_email: bool,
    ) -> Result<SignupAccount, AccountError> {
        let new_account = new_account.sanitized();
        self.settings
            .identity_requirements
            .check(&new_account.username, &new_account.full_name)?;

        let pers = &self.persistence_handler;

        log::trace!(target: "vestibule", "Checking username {} for correspondence ...", new_account.username);

        if pers.username_exists(&new_account.username).await? {
            return Err(AccountError::Generic(format!(
                "Username {} already exists!",
                new_account.username
            )));
        }

        let (_salt, activation_key) = self.secrets.generate(&new_account.username);
        let account = SignupAccount::new(new_account, activation_key, self.clock.now())?;
        let profile = P::fresh(account.uid(), self.settings.default_privacy);

        pers.save_account(&account).await?;
        pers.save_profile(&profile).await?;

        for grant in GrantKind::owner_set() {
            self.grants
                .assign(account.uid(), account.uid(), grant)
                .await?;
        }

        if send_email {
            self.send_activation_email(&account).await?;
        }

        Ok(account)
    }

    /// Checks if the activation key of `account` is expired.
    ///
    /// Returns `true` when the key was already consumed or when the
    /// configured activation window has elapsed since the account was
    /// created. No side effects.
    pub fn activation_key_expired(&self, account: &SignupAccount) -> bool {
        account.is_activation_expired(self.clock.now(), self.settings.activation_days)
    }

    /// Sends the activation email to the account's address. No change to
    /// stored state. Errors when the key was already consumed, since there
    /// is nothing left to mail.
    pub async fn send_activation_email(
        &self,
        account: &SignupAccount,
    ) -> Result<(), AccountError> {
        let key = account
            .activation
            .key()
            .ok_or_else(|| AccountError::msg("The activation key was already consumed"))?;

        let message = templates::activation_email(&MailContext {
            account,
            settings: &self.settings,
            key,
        });

        self.mailer
            .send(
                &message.subject,
                &message.body,
                &self.settings.mail_from,
                &[account.email.clone()],
            )
            .await
    }

    /// Consumes the activation key if `key` matches and the window has not
    /// elapsed. Returns the updated account on success and `None` when the
    /// key is wrong, stale, or already consumed.
    pub async fn activate_account(
        &self,
        user: impl Into<UserIdentifier>,
        key: &str,
    ) -> Result<Option<SignupAccount>, AccountError> {
        let uid = user.into().uid();
        let mut account = self
            .persistence_handler
            .get_account_by_uid(uid)
            .await?
            .ok_or(AccountError::AccountNonExists(uid))?;

        if self.activation_key_expired(&account) {
            return Ok(None);
        }

        if !account.activate(key, self.clock.now()) {
            return Ok(None);
        }

        self.persistence_handler.save_account(&account).await?;
        log::trace!(target: "vestibule", "Activated account {} ({})", account.username(), uid);
        Ok(Some(account))
    }

    /// Changes the email address for a user.
    ///
    /// The new address needs to be confirmed before it becomes active, so
    /// it is stored on the record as the pending change together with a
    /// fresh confirmation key. Issuing a second change while one is pending
    /// replaces it. The record is persisted before the two notification
    /// sends, and stays persisted even when a send fails.
    pub async fn issue_email_change(
        &self,
        user: impl Into<UserIdentifier>,
        new_email: impl Into<String>,
    ) -> Result<SignupAccount, AccountError> {
        let uid = user.into().uid();
        let mut account = self
            .persistence_handler
            .get_account_by_uid(uid)
            .await?
            .ok_or(AccountError::AccountNonExists(uid))?;

        let (_salt, confirmation_key) = self.secrets.generate(account.username());
        account.begin_email_change(new_email.into(), confirmation_key, self.clock.now());
        self.persistence_handler.save_account(&account).await?;

        self.send_confirmation_email(&account).await?;
        Ok(account)
    }

    /// Sends the two messages announcing a pending email change: a notice
    /// to the current address and the confirmation key to the new one.
    ///
    /// Both sends are attempted independently; the first failure is
    /// reported after both ran. The pending change itself is already
    /// persisted by the time this is called.
    pub async fn send_confirmation_email(
        &self,
        account: &SignupAccount,
    ) -> Result<(), AccountError> {
        let pending = account
            .pending_email
            .as_ref()
            .ok_or_else(|| AccountError::msg("No email change is pending for this account"))?;

        let ctx = MailContext {
            account,
            settings: &self.settings,
            key: &pending.confirmation_key,
        };

        let old_message = templates::confirmation_email_old(&ctx, &pending.new_email);
        let new_message = templates::confirmation_email_new(&ctx, &pending.new_email);

        let old_result = self
            .mailer
            .send(
                &old_message.subject,
                &old_message.body,
                &self.settings.mail_from,
                &[account.email.clone()],
            )
            .await;
        let new_result = self
            .mailer
            .send(
                &new_message.subject,
                &new_message.body,
                &self.settings.mail_from,
                &[pending.new_email.clone()],
            )
            .await;

        old_result?;
        new_result
    }

    /// Applies a pending email change if `key` matches its confirmation
    /// key. Returns the updated account, or `None` for wrong or stale keys
    /// (including keys replaced by a newer request).
    pub async fn confirm_email_change(
        &self,
        user: impl Into<UserIdentifier>,
        key: &str,
    ) -> Result<Option<SignupAccount>, AccountError> {
        let uid = user.into().uid();
        let mut account = self
            .persistence_handler
            .get_account_by_uid(uid)
            .await?
            .ok_or(AccountError::AccountNonExists(uid))?;

        if !account.confirm_email_change(key) {
            return Ok(None);
        }

        self.persistence_handler.save_account(&account).await?;
        log::trace!(target: "vestibule", "Confirmed new email for account {} ({})", account.username(), uid);
        Ok(Some(account))
    }

    /// Mails a one-shot reminder to every pending signup whose activation
    /// key expires within the configured notice window. Returns the number
    /// of reminders sent. Accounts already reminded are skipped via the
    /// `activation_notice_sent` flag.
    pub async fn send_expiry_reminders(&self) -> Result<usize, AccountError> {
        if !self.settings.activation_notify {
            return Ok(0);
        }

        let now = self.clock.now();
        let window = self.settings.activation_days;
        let notice_offset = window.saturating_sub(self.settings.activation_notify_days);

        let accounts = self.persistence_handler.get_accounts(None).await?;
        let mut sent = 0;

        for mut account in accounts {
            if account.activation_notice_sent || account.activation.is_consumed() {
                continue;
            }
            if account.is_activation_expired(now, window) {
                continue;
            }
            let notice_at = account.date_joined + Duration::days(i64::from(notice_offset));
            if now < notice_at {
                continue;
            }

            let key = match account.activation.key() {
                Some(key) => key.to_string(),
                None => continue,
            };
            let expires_at = account.date_joined + Duration::days(i64::from(window));
            let days_left = (expires_at - now).num_days().max(0);

            let message = templates::activation_reminder_email(
                &MailContext {
                    account: &account,
                    settings: &self.settings,
                    key: &key,
                },
                days_left,
            );
            self.mailer
                .send(
                    &message.subject,
                    &message.body,
                    &self.settings.mail_from,
                    &[account.email.clone()],
                )
                .await?;

            account.activation_notice_sent = true;
            self.persistence_handler.save_account(&account).await?;
            sent += 1;
        }

        Ok(sent)
    }

    /// Deletes every signup whose activation window elapsed without the key
    /// being consumed, along with its profile and grants. Returns the
    /// number of accounts purged.
    pub async fn purge_expired(&self) -> Result<usize, AccountError> {
        let now = self.clock.now();
        let accounts = self.persistence_handler.get_accounts(None).await?;
        let mut purged = 0;

        for account in accounts {
            if account.activation.is_consumed() {
                continue;
            }
            if !account.is_activation_expired(now, self.settings.activation_days) {
                continue;
            }
            self.delete_account(account.uid()).await?;
            purged += 1;
        }

        log::trace!(target: "vestibule", "Purged {purged} expired signups");
        Ok(purged)
    }

    /// Stamps `last_active` with the current time
    pub async fn touch(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<Option<SignupAccount>, AccountError> {
        let uid = user.into().uid();
        let Some(mut account) = self.persistence_handler.get_account_by_uid(uid).await? else {
            return Ok(None);
        };
        account.last_active = Some(self.clock.now());
        self.persistence_handler.save_account(&account).await?;
        Ok(Some(account))
    }

    /// Returns the account for the given user
    pub async fn get_account(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<Option<SignupAccount>, AccountError> {
        self.persistence_handler
            .get_account_by_uid(user.into().uid())
            .await
    }

    /// Returns the profile for the given user
    pub async fn get_profile(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<Option<P>, AccountError> {
        self.persistence_handler
            .get_profile_by_uid(user.into().uid())
            .await
    }

    /// Gets the metadata for an account without exposing the whole record
    pub async fn get_account_metadata(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<Option<AccountMetadata>, AccountError> {
        self.persistence_handler
            .get_account_metadata(user.into().uid())
            .await
    }

    /// Determines if the user is registered
    pub async fn account_exists(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<bool, AccountError> {
        self.persistence_handler
            .uid_is_registered(user.into().uid())
            .await
    }

    /// Deletes an account, its profile, and every grant on that profile
    pub async fn delete_account(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<(), AccountError> {
        let uid = user.into().uid();
        self.persistence_handler.delete_account_by_uid(uid).await?;
        self.persistence_handler.delete_profile_by_uid(uid).await?;
        self.grants.clear_profile(uid).await
    }

    /// Returns the number of accounts purged
    pub async fn purge(&self) -> Result<usize, AccountError> {
        self.persistence_handler.purge().await
    }

    /// Can the `viewer` view this profile? Delegates to the
    /// [`VisibilityEvaluator`]
    pub async fn can_view_profile(
        &self,
        profile: &BaseProfile,
        viewer: &Viewer,
    ) -> Result<bool, AccountError> {
        self.visibility.can_view(profile, viewer).await
    }

    /// Every stored profile the viewer may see
    pub async fn visible_profiles(
        &self,
        viewer: &Viewer,
        limit: Option<i32>,
    ) -> Result<Vec<P>, AccountError> {
        let profiles = self.persistence_handler.get_profiles(limit).await?;
        let visible = self.visibility.visible_profiles(&profiles, viewer).await?;
        Ok(visible.into_iter().cloned().collect())
    }

    /// Resolves the display image for a user through the stored-upload /
    /// gravatar / configured-default chain
    pub async fn display_image(
        &self,
        user: impl Into<UserIdentifier>,
    ) -> Result<Option<String>, AccountError> {
        let uid = user.into().uid();
        let Some(account) = self.persistence_handler.get_account_by_uid(uid).await? else {
            return Ok(None);
        };
        let Some(profile) = self.persistence_handler.get_profile_by_uid(uid).await? else {
            return Ok(None);
        };
        Ok(profile
            .base()
            .resolve_display_image(&account.email, &self.settings))
    }

    /// Returns the visibility evaluator
    pub fn visibility(&self) -> &VisibilityEvaluator {
        &self.visibility
    }

    /// Returns the persistence handler
    #[doc(hidden)]
    pub fn get_persistence_handler(&self) -> &PersistenceHandler<P> {
        &self.persistence_handler
    }

    /// Returns the settings
    pub fn get_settings(&self) -> &AccountSettings {
        &self.settings
    }

    /// Gets the backend type
    pub fn get_backend_type(&self) -> &BackendType {
        &self.backend_ty
    }
}
