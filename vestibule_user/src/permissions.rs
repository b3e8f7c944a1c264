//! Capability checks for per-profile grants.
//!
//! The authorization engine itself stays outside this crate; the evaluator
//! and the manager only ever ask "which grants does this viewer hold on
//! this profile". Deployments back the trait with whatever engine they run;
//! [`MemoryGrantRegistry`] is the in-process implementation used by tests
//! and single-node setups.

use async_trait::async_trait;
use multimap::MultiMap;
use parking_lot::RwLock;
use std::collections::HashSet;

use crate::misc::AccountError;
use vestibule_types::profile::GrantKind;
use vestibule_types::user::Viewer;

#[async_trait]
pub trait GrantRegistry: Send + Sync + 'static {
    /// Every grant `viewer` holds on the profile owned by `profile_uid`
    async fn grants_for(
        &self,
        viewer: &Viewer,
        profile_uid: u64,
    ) -> Result<HashSet<GrantKind>, AccountError>;

    /// Records a grant for a viewer on a profile
    async fn assign(
        &self,
        viewer_uid: u64,
        profile_uid: u64,
        grant: GrantKind,
    ) -> Result<(), AccountError>;

    /// Removes a previously recorded grant. Removing a grant that was never
    /// assigned is not an error.
    async fn revoke(
        &self,
        viewer_uid: u64,
        profile_uid: u64,
        grant: GrantKind,
    ) -> Result<(), AccountError>;

    /// Drops every grant attached to a profile. Called when the profile's
    /// account is deleted.
    async fn clear_profile(&self, profile_uid: u64) -> Result<(), AccountError>;

    /// Membership test for a single grant
    async fn has_grant(
        &self,
        viewer: &Viewer,
        profile_uid: u64,
        grant: GrantKind,
    ) -> Result<bool, AccountError> {
        Ok(self.grants_for(viewer, profile_uid).await?.contains(&grant))
    }
}

/// In-process grant storage. Admin viewers implicitly hold every grant and
/// are never looked up in the table.
#[derive(Default)]
pub struct MemoryGrantRegistry {
    // (viewer uid, profile uid) -> grants
    grants: RwLock<MultiMap<(u64, u64), GrantKind>>,
}

#[async_trait]
impl GrantRegistry for MemoryGrantRegistry {
    async fn grants_for(
        &self,
        viewer: &Viewer,
        profile_uid: u64,
    ) -> Result<HashSet<GrantKind>, AccountError> {
        let (uid, admin) = match viewer {
            Viewer::Anonymous => return Ok(HashSet::new()),
            Viewer::User { uid, admin } => (*uid, *admin),
        };

        if admin {
            return Ok([
                GrantKind::AddProfile,
                GrantKind::ChangeProfile,
                GrantKind::DeleteProfile,
                GrantKind::ViewProfile,
            ]
            .into_iter()
            .collect());
        }

        Ok(self
            .grants
            .read()
            .get_vec(&(uid, profile_uid))
            .map(|grants| grants.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn assign(
        &self,
        viewer_uid: u64,
        profile_uid: u64,
        grant: GrantKind,
    ) -> Result<(), AccountError> {
        let mut grants = self.grants.write();
        let key = (viewer_uid, profile_uid);
        let already_present = grants
            .get_vec(&key)
            .map(|existing| existing.contains(&grant))
            .unwrap_or(false);
        if !already_present {
            grants.insert(key, grant);
        }
        Ok(())
    }

    async fn revoke(
        &self,
        viewer_uid: u64,
        profile_uid: u64,
        grant: GrantKind,
    ) -> Result<(), AccountError> {
        let mut grants = self.grants.write();
        if let Some(existing) = grants.get_vec_mut(&(viewer_uid, profile_uid)) {
            existing.retain(|g| *g != grant);
        }
        Ok(())
    }

    async fn clear_profile(&self, profile_uid: u64) -> Result<(), AccountError> {
        self.grants
            .write()
            .retain(|(_viewer, profile), _| *profile != profile_uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assign_is_idempotent_and_revoke_removes() {
        let registry = MemoryGrantRegistry::default();
        registry.assign(1, 2, GrantKind::ViewProfile).await.unwrap();
        registry.assign(1, 2, GrantKind::ViewProfile).await.unwrap();

        let viewer = Viewer::registered(1);
        let grants = registry.grants_for(&viewer, 2).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert!(grants.contains(&GrantKind::ViewProfile));

        registry.revoke(1, 2, GrantKind::ViewProfile).await.unwrap();
        assert!(registry.grants_for(&viewer, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admins_hold_everything_implicitly() {
        let registry = MemoryGrantRegistry::default();
        let admin = Viewer::admin(99);
        assert!(registry
            .has_grant(&admin, 123, GrantKind::DeleteProfile)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn clearing_a_profile_drops_all_its_grants() {
        let registry = MemoryGrantRegistry::default();
        registry.assign(1, 2, GrantKind::ViewProfile).await.unwrap();
        registry.assign(3, 2, GrantKind::ChangeProfile).await.unwrap();
        registry.assign(1, 4, GrantKind::ViewProfile).await.unwrap();

        registry.clear_profile(2).await.unwrap();

        assert!(registry
            .grants_for(&Viewer::registered(1), 2)
            .await
            .unwrap()
            .is_empty());
        assert!(registry
            .grants_for(&Viewer::registered(3), 2)
            .await
            .unwrap()
            .is_empty());
        assert!(registry
            .has_grant(&Viewer::registered(1), 4, GrantKind::ViewProfile)
            .await
            .unwrap());
    }
}
