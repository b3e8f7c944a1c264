use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;

use vestibule_user::clock::{Clock, ManualClock};
use vestibule_user::mailer::{Mailer, MemoryMailer};
use vestibule_user::prelude::*;
use vestibule_user::secrets::SecretSource;

fn setup_log() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn day_zero() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn short_window_settings() -> AccountSettings {
    let mut settings = AccountSettings::default();
    settings.activation_days = 2;
    settings.activation_notify_days = 1;
    settings.site_name = "Vestibule Test".to_string();
    settings.site_domain = "vestibule.test".to_string();
    settings
}

async fn manager_with(
    settings: AccountSettings,
) -> (AccountManager, Arc<MemoryMailer>, Arc<ManualClock>) {
    let mailer = Arc::new(MemoryMailer::default());
    let clock = Arc::new(ManualClock::starting_at(day_zero()));
    let manager = AccountManager::new(
        BackendType::InMemory,
        mailer.clone(),
        Some(settings),
        None,
    )
    .await
    .unwrap()
    .with_clock(clock.clone());
    (manager, mailer, clock)
}

fn alice() -> NewAccount {
    NewAccount::new("alice", "Alice Doe", "alice@example.com")
}

/// Hands out predictable keys so tests can redeem them
struct SequentialSecrets {
    counter: Mutex<u32>,
}

impl SequentialSecrets {
    fn new() -> Self {
        Self {
            counter: Mutex::new(0),
        }
    }
}

impl SecretSource for SequentialSecrets {
    fn generate(&self, _seed: &str) -> (String, String) {
        let mut counter = self.counter.lock();
        *counter += 1;
        (format!("salt{counter}"), format!("key-{counter}"))
    }
}

/// Fails every send once armed, while counting the attempts
#[derive(Default)]
struct FlakyMailer {
    failing: AtomicBool,
    attempts: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl Mailer for FlakyMailer {
    async fn send(
        &self,
        _subject: &str,
        _body: &str,
        _from: &str,
        to: &[String],
    ) -> Result<(), AccountError> {
        self.attempts.lock().push(to.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            Err(AccountError::MailError("smtp unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn signup_persists_records_and_mails_the_activation_key() {
    setup_log();
    let (manager, mailer, _clock) = manager_with(short_window_settings()).await;

    let account = manager.create_account(alice(), true).await.unwrap();
    assert!(!account.active);
    assert_eq!(account.username(), "alice");

    // the activation key is a 40-hex-char token
    let key = account.activation.key().unwrap();
    assert_eq!(key.len(), 40);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

    // one outbound message, to the signup address, carrying the key
    let outbox = mailer.take();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, vec!["alice@example.com".to_string()]);
    assert!(outbox[0].body.contains(key));
    assert!(outbox[0].subject.contains("Vestibule Test"));

    // the profile exists with the configured default privacy
    let profile = manager.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(profile.privacy, PrivacyLevel::Registered);
    assert_eq!(profile.uid(), account.uid());
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let (manager, _mailer, _clock) = manager_with(short_window_settings()).await;
    let _ = manager.create_account(alice(), false).await.unwrap();
    assert!(manager
        .create_account(
            NewAccount::new("alice", "Other Alice", "other@example.com"),
            false
        )
        .await
        .is_err());
}

#[tokio::test]
async fn expiry_follows_the_two_day_window() {
    let (manager, _mailer, clock) = manager_with(short_window_settings()).await;
    let account = manager.create_account(alice(), false).await.unwrap();

    // day 1: still redeemable
    clock.advance(Duration::days(1));
    assert!(!manager.activation_key_expired(&account));

    // day 3: stale regardless of the key value
    clock.advance(Duration::days(2));
    assert!(manager.activation_key_expired(&account));

    let key = account.activation.key().unwrap().to_string();
    let outcome = manager.activate_account("alice", &key).await.unwrap();
    assert!(outcome.is_none());

    let stored = manager.get_account("alice").await.unwrap().unwrap();
    assert!(!stored.active);
    assert!(!stored.activation.is_consumed());
}

#[tokio::test]
async fn activation_consumes_the_key_exactly_once() {
    let (manager, _mailer, clock) = manager_with(short_window_settings()).await;
    let account = manager.create_account(alice(), false).await.unwrap();
    let key = account.activation.key().unwrap().to_string();

    clock.advance(Duration::days(1));

    // wrong key first
    assert!(manager
        .activate_account("alice", "not-the-key")
        .await
        .unwrap()
        .is_none());

    let activated = manager
        .activate_account("alice", &key)
        .await
        .unwrap()
        .unwrap();
    assert!(activated.active);
    assert!(activated.activation.is_consumed());
    assert_eq!(activated.last_active, Some(clock.now()));

    // a consumed key counts as expired immediately, and never redeems again
    assert!(manager.activation_key_expired(&activated));
    assert!(manager
        .activate_account("alice", &key)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn reissued_email_change_keeps_only_the_latest_request() {
    let (manager, mailer, _clock) = manager_with(short_window_settings()).await;
    let manager = manager.with_secret_source(Arc::new(SequentialSecrets::new()));

    let _ = manager.create_account(alice(), false).await.unwrap();
    // key-1 is the activation key, so the two changes get key-2 and key-3
    let _ = manager
        .issue_email_change("alice", "new@x.com")
        .await
        .unwrap();
    let account = manager
        .issue_email_change("alice", "newer@x.com")
        .await
        .unwrap();

    let pending = account.pending_email.as_ref().unwrap();
    assert_eq!(pending.new_email, "newer@x.com");

    // each issuance sends a notice to the old address and a key to the new one
    let outbox = mailer.take();
    assert_eq!(outbox.len(), 4);
    assert_eq!(outbox[0].to, vec!["alice@example.com".to_string()]);
    assert_eq!(outbox[1].to, vec!["new@x.com".to_string()]);
    assert_eq!(outbox[2].to, vec!["alice@example.com".to_string()]);
    assert_eq!(outbox[3].to, vec!["newer@x.com".to_string()]);
    assert!(outbox[3].body.contains("key-3"));

    // the replaced key no longer confirms anything
    assert!(manager
        .confirm_email_change("alice", "key-2")
        .await
        .unwrap()
        .is_none());

    let confirmed = manager
        .confirm_email_change("alice", "key-3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.email, "newer@x.com");
    assert!(confirmed.pending_email.is_none());

    // and the confirmation key is single-use
    assert!(manager
        .confirm_email_change("alice", "key-3")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_sends_leave_the_pending_change_durable() {
    let mailer = Arc::new(FlakyMailer::default());
    let clock = Arc::new(ManualClock::starting_at(day_zero()));
    let manager: AccountManager = AccountManager::new(
        BackendType::InMemory,
        mailer.clone(),
        Some(short_window_settings()),
        None,
    )
    .await
    .unwrap()
    .with_clock(clock);

    let _ = manager.create_account(alice(), false).await.unwrap();

    mailer.failing.store(true, Ordering::SeqCst);
    let result = manager.issue_email_change("alice", "new@x.com").await;
    assert!(matches!(result, Err(AccountError::MailError(_))));

    // both sends were attempted despite the first failure
    let attempts = mailer.attempts.lock().clone();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0], vec!["alice@example.com".to_string()]);
    assert_eq!(attempts[1], vec!["new@x.com".to_string()]);

    // the record change was persisted before the sends
    let stored = manager.get_account("alice").await.unwrap().unwrap();
    let pending = stored.pending_email.unwrap();
    assert_eq!(pending.new_email, "new@x.com");
}

#[tokio::test]
async fn reminders_go_out_exactly_once_per_account() {
    let (manager, mailer, clock) = manager_with(short_window_settings()).await;
    let _ = manager.create_account(alice(), false).await.unwrap();
    let bob = manager
        .create_account(NewAccount::new("bob", "Bob Roe", "bob@example.com"), false)
        .await
        .unwrap();

    // bob activates right away; only alice should ever be reminded
    let bob_key = bob.activation.key().unwrap().to_string();
    let _ = manager.activate_account("bob", &bob_key).await.unwrap();
    let _ = mailer.take();

    // too early: the notice window opens one day before expiry
    assert_eq!(manager.send_expiry_reminders().await.unwrap(), 0);

    clock.advance(Duration::hours(30));
    assert_eq!(manager.send_expiry_reminders().await.unwrap(), 1);
    let outbox = mailer.take();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, vec!["alice@example.com".to_string()]);

    // the flag is durable, so the sweep stays quiet afterwards
    assert_eq!(manager.send_expiry_reminders().await.unwrap(), 0);
    let stored = manager.get_account("alice").await.unwrap().unwrap();
    assert!(stored.activation_notice_sent);
}

#[tokio::test]
async fn purge_expired_removes_only_stale_signups() {
    let (manager, _mailer, clock) = manager_with(short_window_settings()).await;
    let _ = manager.create_account(alice(), false).await.unwrap();
    let bob = manager
        .create_account(NewAccount::new("bob", "Bob Roe", "bob@example.com"), false)
        .await
        .unwrap();
    let bob_key = bob.activation.key().unwrap().to_string();
    let _ = manager.activate_account("bob", &bob_key).await.unwrap();

    clock.advance(Duration::days(3));
    assert_eq!(manager.purge_expired().await.unwrap(), 1);

    assert!(!manager.account_exists("alice").await.unwrap());
    assert!(manager.get_profile("alice").await.unwrap().is_none());
    assert!(manager.account_exists("bob").await.unwrap());
}

#[tokio::test]
async fn touch_stamps_last_active() {
    let (manager, _mailer, clock) = manager_with(short_window_settings()).await;
    let account = manager.create_account(alice(), false).await.unwrap();
    assert!(account.last_active.is_none());

    clock.advance(Duration::hours(5));
    let touched = manager.touch("alice").await.unwrap().unwrap();
    assert_eq!(touched.last_active, Some(clock.now()));

    assert!(manager.touch("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn identifier_search_finds_accounts_and_profiles() {
    let (manager, _mailer, _clock) = manager_with(short_window_settings()).await;
    let account = manager.create_account(alice(), false).await.unwrap();

    let by_name = UserIdentifier::from("alice");
    let found = by_name.search(&manager).await.unwrap().unwrap();
    assert_eq!(found.uid(), account.uid());

    let by_uid = UserIdentifier::from(account.uid());
    let profile = by_uid.search_profile(&manager).await.unwrap().unwrap();
    assert_eq!(profile.uid(), account.uid());
    assert_eq!(by_uid.get_uid(), account.uid());
}

#[tokio::test]
async fn display_image_falls_back_to_gravatar() {
    let (manager, _mailer, _clock) = manager_with(short_window_settings()).await;
    let _ = manager.create_account(alice(), false).await.unwrap();

    let url = manager.display_image("alice").await.unwrap().unwrap();
    assert!(url.starts_with("https://www.gravatar.com/avatar/"));
    assert!(url.contains("s=80"));
}
