use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::secrets::SecretSource;
use crate::settings::AccountSettings;

/// Keyword defaults the gravatar service renders itself. A configured
/// default equal to one of these is a service instruction, never a URL of
/// our own.
pub const GRAVATAR_BUILTIN_DEFAULTS: [&str; 5] = ["404", "mm", "identicon", "monsterid", "wavatar"];

/// Crop policy applied when an uploaded image gets resized by the image
/// pipeline (an external collaborator; this crate only records the policy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MugshotCrop {
    /// Crop towards the most interesting region
    #[default]
    Smart,
    /// Crop from the center
    Center,
    /// Scale without cropping
    Scale,
}

/// A stored display image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mugshot {
    /// Where the image is served from
    pub url: String,
}

impl Mugshot {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self { url: url.into() }
    }
}

/// Builds the gravatar-style URL for an email address. The address hash is
/// SHA-256 of the trimmed, lowercased address, per the service's
/// addressing scheme.
pub fn gravatar_url(email: &str, size: u32, default: &str) -> String {
    let hash = sha256::digest(email.trim().to_lowercase());
    let mut url = format!("https://www.gravatar.com/avatar/{hash}?s={size}");
    if !default.is_empty() {
        url.push_str("&d=");
        url.push_str(&query_escape(default));
    }
    url
}

/// Produces the storage filename for an uploaded mugshot. The name is a
/// salted hash so the upload directory does not leak who owns which image.
pub fn mugshot_storage_name(
    uid: u64,
    filename: &str,
    settings: &AccountSettings,
    secrets: &dyn SecretSource,
) -> String {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or("img")
        .to_lowercase();
    let (_salt, key) = secrets.generate(&uid.to_string());
    format!("{}{}.{}", settings.mugshot_path, &key[..10], extension)
}

/// Percent-encodes a query-string value
fn query_escape(value: &str) -> String {
    value.bytes().fold(String::new(), |mut out, byte| {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::RandomSecretSource;

    #[test]
    fn gravatar_hash_is_normalized() {
        let a = gravatar_url("  Alice@Example.COM ", 80, "");
        let b = gravatar_url("alice@example.com", 80, "");
        assert_eq!(a, b);
        assert!(a.contains("?s=80"));
        assert!(!a.contains("&d="));
    }

    #[test]
    fn gravatar_default_is_escaped() {
        let url = gravatar_url("alice@example.com", 80, "https://cdn.test/fallback.png");
        assert!(url.ends_with("&d=https%3A%2F%2Fcdn.test%2Ffallback.png"));

        let keyword = gravatar_url("alice@example.com", 80, "identicon");
        assert!(keyword.ends_with("&d=identicon"));
    }

    #[test]
    fn storage_name_hides_the_owner() {
        let settings = AccountSettings::default();
        let name = mugshot_storage_name(42, "Portrait.JPG", &settings, &RandomSecretSource);
        assert!(name.starts_with(&settings.mugshot_path));
        assert!(name.ends_with(".jpg"));

        let base = name
            .trim_start_matches(settings.mugshot_path.as_str())
            .trim_end_matches(".jpg");
        assert_eq!(base.len(), 10);
        assert!(base.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
