//! # Vestibule User Management
//!
//! A user-account extension library handling signup, activation, email-change
//! confirmation, and profile privacy. This crate owns the lifecycle records
//! and the decisions around them; persistence, mail transport, permission
//! engines, and image pipelines stay behind trait seams.
//!
//! ## Features
//!
//! * **Account Lifecycle**:
//!   - Signup with activation keys and expiry windows
//!   - Email-change confirmation with last-write-wins reissue
//!   - One-shot expiry reminders and purging of stale signups
//!
//! * **Profiles**:
//!   - Open / registered / closed privacy tiers
//!   - Grant-based overrides for owners, admins, and explicit shares
//!   - Display-image resolution with a gravatar-style fallback chain
//!
//! * **Backend Support**:
//!   - File System Storage: persistent local storage
//!   - In-Memory Storage: fast temporary storage
//!
//! ## Important Notes
//!
//! * Records are persisted before the notifications announcing them go out;
//!   a failed send never rolls stored state back
//! * Activation keys move from pending to consumed exactly once
//! * File system operations are feature-gated, enabled by default
//!
//! ## Feature Flags
//!
//! * `filesystem`: Enable file system storage
//!
#![forbid(unsafe_code)]
#![deny(
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    variant_size_differences,
    unused_features,
    unused_results
)]
#![allow(rustdoc::broken_intra_doc_links)]

/// Standard imports for this library
pub mod prelude {
    pub use crate::account::*;
    pub use crate::account_manager::*;
    pub use crate::backend::{BackendType, PersistenceHandler};
    pub use crate::identifier_search::UserIdentifierExt;
    pub use crate::identity::NewAccount;
    pub use crate::misc::AccountError;
    pub use crate::profile::*;
    pub use crate::settings::AccountSettings;
    pub use vestibule_types::prelude::*;
}

/// Serde and others
pub mod re_exports {
    #[cfg(feature = "filesystem")]
    pub use crate::directory_store::DirectoryStore;
    pub use serde::*;
}

/// The per-user signup record and its state transitions
pub mod account;
/// The facade over the lifecycle, storage, and collaborators
pub mod account_manager;
/// For handling different I/O operations
pub mod backend;
/// The wall-clock seam
pub mod clock;
#[cfg(feature = "filesystem")]
/// Environmental constants and subroutines for pre-checking the system
pub mod directory_store;
/// UserIdentifier-driven lookups
pub mod identifier_search;
pub mod identity;
/// The outbound notification seam
pub mod mailer;
/// For errors
pub mod misc;
/// Display images and the gravatar fallback chain
pub mod mugshot;
/// Capability checks against the permission registry
pub mod permissions;
/// Profile records and the extension seam
pub mod profile;
#[cfg(feature = "filesystem")]
/// This provides methods to load all locally-stored records
pub mod record_loader;
/// Opaque-key generation
pub mod secrets;
/// Contains basic subroutines for serialization
pub mod serialization;
pub mod settings;
/// Mail rendering for the lifecycle notifications
pub mod templates;
/// Profile privacy decisions
pub mod visibility;
