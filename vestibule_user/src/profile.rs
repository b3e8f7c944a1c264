//! # Profile Records
//!
//! The storable profile attached to every account, plus the extension seam
//! for applications that need richer profiles. The base record carries only
//! what the privacy evaluator and the display-image chain need; everything
//! else belongs to the extending type.
//!
//! ## Extending
//!
//! The storage layer and the [`AccountManager`](crate::account_manager::AccountManager)
//! are generic over `P: UserProfile` with [`BaseProfile`] as the default, so
//! an application defines its own struct embedding a [`BaseProfile`] and
//! implements the trait; [`LocaleProfile`] shows the pattern.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::mugshot::{gravatar_url, Mugshot, GRAVATAR_BUILTIN_DEFAULTS};
use crate::settings::AccountSettings;
use vestibule_types::profile::PrivacyLevel;

/// The trait every storable profile implements. The base accessors give the
/// privacy evaluator and the backends a uniform view regardless of the
/// concrete profile type.
pub trait UserProfile:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    fn base(&self) -> &BaseProfile;
    fn base_mut(&mut self) -> &mut BaseProfile;
    /// The profile a brand-new signup receives
    fn fresh(uid: u64, privacy: PrivacyLevel) -> Self;
}

/// The core profile record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProfile {
    /// Owner identity; the storage key for this record
    uid: u64,
    /// Who may view this profile
    pub privacy: PrivacyLevel,
    /// The uploaded display image, if any
    pub mugshot: Option<Mugshot>,
}

impl BaseProfile {
    pub fn new(uid: u64, privacy: PrivacyLevel) -> Self {
        Self {
            uid,
            privacy,
            mugshot: None,
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Resolves the image to display for this profile.
    ///
    /// The chain is: the stored upload, else the gravatar service when
    /// enabled, else the configured default image. A configured default
    /// equal to one of the gravatar builtin keywords only makes sense as a
    /// service instruction, so without gravatar it resolves to `None`
    /// rather than leaking the keyword as a URL.
    pub fn resolve_display_image(
        &self,
        email: &str,
        settings: &AccountSettings,
    ) -> Option<String> {
        if let Some(mugshot) = &self.mugshot {
            return Some(mugshot.url.clone());
        }

        if settings.mugshot_gravatar {
            return Some(gravatar_url(
                email,
                settings.mugshot_size,
                &settings.mugshot_default,
            ));
        }

        let default = settings.mugshot_default.as_str();
        if default.is_empty() || GRAVATAR_BUILTIN_DEFAULTS.contains(&default) {
            None
        } else {
            Some(default.to_string())
        }
    }
}

impl UserProfile for BaseProfile {
    fn base(&self) -> &BaseProfile {
        self
    }

    fn base_mut(&mut self) -> &mut BaseProfile {
        self
    }

    fn fresh(uid: u64, privacy: PrivacyLevel) -> Self {
        BaseProfile::new(uid, privacy)
    }
}

/// A profile carrying a preferred interface language. Mostly here as the
/// canonical example of extending [`BaseProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleProfile {
    pub base: BaseProfile,
    /// ISO 639-1 language code
    pub language: String,
}

impl UserProfile for LocaleProfile {
    fn base(&self) -> &BaseProfile {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProfile {
        &mut self.base
    }

    fn fresh(uid: u64, privacy: PrivacyLevel) -> Self {
        Self {
            base: BaseProfile::new(uid, privacy),
            language: "en".to_string(),
        }
    }
}
