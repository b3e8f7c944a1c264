//! # Directory Store Management
//!
//! Manages the on-disk layout used by the filesystem backend: directory
//! creation, path management, and file organization.
//!
//! ## Directory Structure
//!
//! ```text
//! <home>/
//! ├── accounts/    # Serialized signup accounts
//! ├── profiles/    # Serialized profiles
//! └── config/      # Configuration files
//! ```
//!
//! ## Important Notes
//!
//! * All paths are automatically formatted for the target OS
//! * The directory structure is created on initialization

use crate::misc::AccountError;
use std::fs::create_dir_all as mkdir;
use std::path::PathBuf;

/// Conventional home-directory name for deployments that do not pick one
pub const BASE_NAME: &str = ".vestibule";

/// Correlated to important directories for the program
#[allow(missing_docs)]
pub enum BasePath {
    Home,
    AccountDir,
    ProfileDir,
    ConfigDir,
}

#[derive(Clone)]
/// Stores important information for the filesystem
pub struct DirectoryStore {
    /// The backend home-directory
    pub home: String,
    /// Directory for serialized accounts
    pub account_dir: String,
    /// Directory for serialized profiles
    pub profile_dir: String,
    /// Configuration files
    pub config_dir: String,
}

impl DirectoryStore {
    /// Creates a properly formatted path given the `base` value (the base value should come from self)
    pub fn make_path<T: AsRef<str>>(&self, base: BasePath, file: T) -> PathBuf {
        let base = match base {
            BasePath::Home => &self.home,
            BasePath::AccountDir => &self.account_dir,
            BasePath::ProfileDir => &self.profile_dir,
            BasePath::ConfigDir => &self.config_dir,
        };

        PathBuf::from(append_to_path(base.clone(), file.as_ref()))
    }
}

fn setup_directory(mut home_dir: String) -> DirectoryStore {
    let home = {
        if !home_dir.ends_with('/') {
            home_dir.push('/');
        }
        #[cfg(target_os = "windows")]
        {
            if !home_dir.ends_with('\\') {
                home_dir.push('\\');
            }
        }

        home_dir
    };

    DirectoryStore {
        home: home.clone(),
        account_dir: append_to_path(home.clone(), "accounts/"),
        profile_dir: append_to_path(home.clone(), "profiles/"),
        config_dir: append_to_path(home, "config/"),
    }
}

fn append_to_path(base: String, addition: &str) -> String {
    format_path(base + addition)
}

#[cfg(not(target_os = "windows"))]
fn format_path(input: String) -> String {
    input.replace('\\', "/")
}

#[cfg(target_os = "windows")]
fn format_path(input: String) -> String {
    input.replace('/', "\\")
}

/// Sets up the local directories that are pre-requisite to opening the
/// filesystem backend
pub fn setup_directories(home_dir: String) -> Result<DirectoryStore, AccountError> {
    let store = setup_directory(home_dir);
    let base = mkdir(store.home.as_str());

    base.and(mkdir(store.account_dir.as_str()))
        .and(mkdir(store.profile_dir.as_str()))
        .and(mkdir(store.config_dir.as_str()))
        .map_err(|err| AccountError::IoError(err.to_string()))?;

    Ok(store)
}
