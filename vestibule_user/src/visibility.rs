//! # Profile Visibility
//!
//! Decides whether a viewer may see a profile. The decision is re-evaluated
//! on every call; nothing here caches, so a revoked grant takes effect on
//! the next check.
//!
//! The check order is a deliberate cost ordering, not a style choice: the
//! two privacy tiers that can answer from the record alone are tested
//! before the grant registry round trip.

use futures::stream::FuturesOrdered;
use futures::StreamExt;
use std::sync::Arc;

use crate::misc::AccountError;
use crate::permissions::GrantRegistry;
use crate::profile::{BaseProfile, UserProfile};
use vestibule_types::profile::{GrantKind, PrivacyLevel};
use vestibule_types::user::Viewer;

/// Evaluates profile visibility against the stored privacy level and the
/// grant registry
#[derive(Clone)]
pub struct VisibilityEvaluator {
    grants: Arc<dyn GrantRegistry>,
}

impl VisibilityEvaluator {
    pub fn new(grants: Arc<dyn GrantRegistry>) -> Self {
        Self { grants }
    }

    /// Can the `viewer` view this profile?
    ///
    /// Viewers are divided into four groups:
    ///
    ///    `Open`
    ///        Everyone can view the profile
    ///
    ///    `Closed`
    ///        Nobody can view the profile
    ///
    ///    `Registered`
    ///        Users that are registered on the website and signed in only
    ///
    ///    `Admin`
    ///        Special cases like the superuser and the owner of the profile,
    ///        honored through the grant registry
    pub async fn can_view(
        &self,
        profile: &BaseProfile,
        viewer: &Viewer,
    ) -> Result<bool, AccountError> {
        // Simple cases first, we don't want to waste CPU and registry hits.
        match profile.privacy {
            // Everyone.
            PrivacyLevel::Open => return Ok(true),
            // Registered users.
            PrivacyLevel::Registered if viewer.is_authenticated() => return Ok(true),
            _ => {}
        }

        // Owner, admins and explicit grants are all resolved by the registry.
        if self
            .grants
            .has_grant(viewer, profile.uid(), GrantKind::ViewProfile)
            .await?
        {
            return Ok(true);
        }

        // Fallback to closed profile.
        Ok(false)
    }

    /// Filters `profiles` down to the ones `viewer` may see, preserving
    /// order. The checks run concurrently.
    pub async fn visible_profiles<'a, P: UserProfile>(
        &self,
        profiles: &'a [P],
        viewer: &Viewer,
    ) -> Result<Vec<&'a P>, AccountError> {
        let mut queue = FuturesOrdered::new();
        for profile in profiles {
            queue.push_back(self.can_view(profile.base(), viewer));
        }
        let verdicts = queue.collect::<Vec<_>>().await;

        let mut visible = Vec::new();
        for (profile, verdict) in profiles.iter().zip(verdicts) {
            if verdict? {
                visible.push(profile);
            }
        }
        Ok(visible)
    }
}
