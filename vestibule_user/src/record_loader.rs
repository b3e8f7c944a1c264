use crate::account::SignupAccount;
use crate::directory_store::DirectoryStore;
use crate::misc::AccountError;
use crate::profile::UserProfile;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The file extension for serialized signup accounts
pub const ACCOUNT_SERIALIZED_EXTENSION: &str = "uac";
/// The file extension for serialized profiles
pub const PROFILE_SERIALIZED_EXTENSION: &str = "upf";

/// Loads all locally-stored accounts, keyed by uid
pub fn load_account_files(
    ds: &DirectoryStore,
) -> Result<HashMap<u64, SignupAccount>, AccountError> {
    let accounts = load_file_types_by_ext::<SignupAccount, _>(
        ACCOUNT_SERIALIZED_EXTENSION,
        ds.account_dir.as_str(),
    )?;
    log::trace!(target: "vestibule", "[Record Loader] Signup accounts loaded: {}", accounts.len());

    Ok(accounts
        .into_iter()
        .map(|(account, _path)| (account.uid(), account))
        .collect())
}

/// Loads all locally-stored profiles, keyed by the owning uid
pub fn load_profile_files<P: UserProfile>(
    ds: &DirectoryStore,
) -> Result<HashMap<u64, P>, AccountError> {
    let profiles =
        load_file_types_by_ext::<P, _>(PROFILE_SERIALIZED_EXTENSION, ds.profile_dir.as_str())?;
    log::trace!(target: "vestibule", "[Record Loader] Profiles loaded: {}", profiles.len());

    Ok(profiles
        .into_iter()
        .map(|(profile, _path)| (profile.base().uid(), profile))
        .collect())
}

/// Returns an array of a specific deserialized item types filtered by the extension type.
/// Returns any possibly existent types that [A] exist within the specific directory (no recursion),
/// [B] are files, [C] contain the appropriate file extension, and [D] files which are successfully
/// serialized. Further, it returns the PathBuf associated with the file
pub fn load_file_types_by_ext<D: DeserializeOwned, P: AsRef<Path>>(
    ext: &str,
    path: P,
) -> Result<Vec<(D, PathBuf)>, AccountError> {
    let mut dir =
        std::fs::read_dir(path.as_ref()).map_err(|err| AccountError::IoError(err.to_string()))?;
    let mut files = Vec::new();
    while let Some(Ok(child)) = dir.next() {
        let path_buf = child.path();
        if let Some(extension) = path_buf.extension() {
            if extension == ext && path_buf.is_file() {
                files.push(path_buf);
            }
        }
    }

    let mut ret = Vec::new();

    for file in files {
        match read::<D, _>(&file) {
            Ok(val) => {
                ret.push((val, PathBuf::from(file.as_path())));
            }

            Err(err) => {
                log::error!(target: "vestibule", "Error loading: {:?}", err);
            }
        }
    }

    Ok(ret)
}

/// Reads the given path as the given type, D
pub fn read<D: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<D, AccountError> {
    std::fs::File::open(path.as_ref())
        .map_err(|err| AccountError::IoError(err.to_string()))
        .and_then(|file| {
            bincode::deserialize_from(std::io::BufReader::new(file))
                .map_err(|err| AccountError::IoError(err.to_string()))
        })
}
