//! Account Settings Management
//!
//! The configuration value object handed to the [`AccountManager`] at
//! construction. Nothing in this crate reads process-wide configuration;
//! every knob that governs the lifecycle, the outbound mail, and the
//! mugshot fallback chain lives here.
//!
//! # Important Notes
//!
//! * `validate` runs at manager construction; a missing sender address or
//!   site domain is a startup-time failure, not a per-request one
//! * Configs written against the legacy key names (`verification_days`,
//!   `verified_sentinel`) still deserialize; the current names take
//!   precedence when both appear
//!
//! # Related Components
//!
//! * [`IdentityRequirements`] - Defines username and full-name requirements
//! * `AccountManager` - Uses these settings for the whole lifecycle
//!
//! [`AccountManager`]: crate::account_manager::AccountManager
//! [`IdentityRequirements`]: crate::identity::IdentityRequirements

use crate::identity::IdentityRequirements;
use crate::misc::AccountError;
use crate::mugshot::MugshotCrop;
use serde::{Deserialize, Serialize};
use vestibule_types::account::CONSUMED_KEY_SENTINEL;
use vestibule_types::profile::PrivacyLevel;

/// Settings for every component of the account library
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// How many days a fresh signup has to use its activation key
    #[serde(alias = "verification_days")]
    pub activation_days: u32,
    /// If enabled, the reminder sweep mails accounts whose key is close to expiry
    pub activation_notify: bool,
    /// How many days before expiry the reminder goes out
    pub activation_notify_days: u32,
    /// Render links with https instead of http
    pub use_https: bool,
    /// Sender address for every outbound message
    pub mail_from: String,
    /// Human-readable site name used in mail copy
    pub site_name: String,
    /// Domain used to build activation and confirmation links
    pub site_domain: String,
    /// Privacy level stamped onto newly created profiles
    pub default_privacy: PrivacyLevel,
    /// Square pixel size requested for display images
    pub mugshot_size: u32,
    /// Crop policy applied when an uploaded image is resized
    pub mugshot_crop: MugshotCrop,
    /// Whether to fall back to the gravatar service for accounts without an upload
    pub mugshot_gravatar: bool,
    /// Fallback image: a URL, or one of the reserved gravatar builtin keywords
    pub mugshot_default: String,
    /// Directory prefix for uploaded display images
    pub mugshot_path: String,
    /// The flat-string marker written for consumed keys at interop boundaries
    #[serde(alias = "verified_sentinel")]
    pub activated_sentinel: String,
    /// Enforces specific requirements on new identities
    pub identity_requirements: IdentityRequirements,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            activation_days: 7,
            activation_notify: true,
            activation_notify_days: 2,
            use_https: false,
            mail_from: "webmaster@localhost".to_string(),
            site_name: "example.com".to_string(),
            site_domain: "example.com".to_string(),
            default_privacy: PrivacyLevel::default(),
            mugshot_size: 80,
            mugshot_crop: MugshotCrop::default(),
            mugshot_gravatar: true,
            mugshot_default: "identicon".to_string(),
            mugshot_path: "mugshots/".to_string(),
            activated_sentinel: CONSUMED_KEY_SENTINEL.to_string(),
            identity_requirements: Default::default(),
        }
    }
}

impl AccountSettings {
    /// Parses settings from a JSON document. Accepts the legacy key names
    /// as aliases for the activation pair.
    pub fn from_json(input: &str) -> Result<Self, AccountError> {
        serde_json::from_str(input).map_err(|err| AccountError::Misconfigured(err.to_string()))
    }

    /// Checked at manager construction
    pub fn validate(&self) -> Result<(), AccountError> {
        if self.mail_from.trim().is_empty() {
            return Err(AccountError::Misconfigured(
                "A sender address (mail_from) is required".to_string(),
            ));
        }

        if self.site_domain.trim().is_empty() {
            return Err(AccountError::Misconfigured(
                "A site domain is required to build activation links".to_string(),
            ));
        }

        if self.activation_days == 0 {
            return Err(AccountError::Misconfigured(
                "The activation window must be at least one day".to_string(),
            ));
        }

        if self.activation_notify_days > self.activation_days {
            return Err(AccountError::Misconfigured(format!(
                "The reminder offset ({} days) cannot exceed the activation window ({} days)",
                self.activation_notify_days, self.activation_days
            )));
        }

        Ok(())
    }

    /// The scheme used for links in outbound mail
    pub fn scheme(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }
}
