use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who may view a profile. The owner picks one of three tiers; anything
/// finer-grained (owner/admin/explicit grants) is resolved through the
/// permission registry, not stored on the profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Everyone can view the profile
    Open,
    /// Only signed-in users can view the profile
    #[default]
    Registered,
    /// Nobody can view the profile without an explicit grant
    Closed,
}

/// Per-object permissions a viewer may hold on a profile. The wire names
/// are fixed independently of the concrete profile type so that extended
/// profile models keep the same grant vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    AddProfile,
    ChangeProfile,
    DeleteProfile,
    ViewProfile,
}

impl GrantKind {
    /// The grants a profile owner receives at signup
    pub fn owner_set() -> [GrantKind; 3] {
        [
            GrantKind::ViewProfile,
            GrantKind::ChangeProfile,
            GrantKind::DeleteProfile,
        ]
    }
}
