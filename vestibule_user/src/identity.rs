use crate::misc::AccountError;
use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct IdentityRequirements {
    pub min_username_length: u8,
    pub max_username_length: u8,
    pub min_name_length: u8,
    pub max_name_length: u8,
}

impl Default for IdentityRequirements {
    fn default() -> Self {
        Self {
            min_username_length: MIN_USERNAME_LENGTH,
            max_username_length: MAX_USERNAME_LENGTH,
            min_name_length: MIN_NAME_LENGTH,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

impl IdentityRequirements {
    /// Used to determine if the desired identity has a valid format, length, etc. This alone
    /// DOES NOT imply whether or not the username is available
    pub fn check<T: AsRef<str>, R: AsRef<str>>(
        &self,
        username: T,
        full_name: R,
    ) -> Result<(), AccountError> {
        let username = username.as_ref();
        let full_name = full_name.as_ref();

        if username.len() < self.min_username_length as _
            || username.len() > self.max_username_length as _
        {
            return Err(AccountError::InvalidIdentity(format!(
                "Username must be between {} and {} characters",
                self.min_username_length, self.max_username_length
            )));
        }

        if username.contains(' ') {
            return Err(AccountError::InvalidIdentity(
                "Username cannot contain spaces. Use a period instead".to_string(),
            ));
        }

        if full_name.len() < self.min_name_length as _
            || full_name.len() > self.max_name_length as _
        {
            return Err(AccountError::InvalidIdentity(format!(
                "Full name must be between {} and {} characters",
                self.min_name_length, self.max_name_length
            )));
        }

        Ok(())
    }
}

///
pub const MIN_USERNAME_LENGTH: u8 = 3;
///
pub const MAX_USERNAME_LENGTH: u8 = 37;

///
pub const MIN_NAME_LENGTH: u8 = 2;
///
pub const MAX_NAME_LENGTH: u8 = 77;

/// The identity proposed at signup. Email format is assumed to be validated
/// by the caller; only the username and full name are checked here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub full_name: String,
    pub email: String,
}

impl NewAccount {
    pub fn new<T: Into<String>, R: Into<String>, V: Into<String>>(
        username: T,
        full_name: R,
        email: V,
    ) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            email: email.into(),
        }
    }

    /// Trims surrounding whitespace from every field.
    ///
    /// 'Whitespace' is defined according to the terms of the Unicode Derived Core Property
    /// White_Space.
    pub fn sanitized(self) -> Self {
        Self {
            username: sanitize(self.username),
            full_name: sanitize(self.full_name),
            email: sanitize(self.email),
        }
    }
}

fn sanitize(input: String) -> String {
    input.as_bytes().trim().to_str_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("jo", "Jo Smith")]
    #[case("a.very.long.username.that.keeps.going.forever", "Jo Smith")]
    #[case("jo smith", "Jo Smith")]
    #[case("josmith", "J")]
    fn bad_identities_are_rejected(#[case] username: &str, #[case] full_name: &str) {
        assert!(IdentityRequirements::default()
            .check(username, full_name)
            .is_err());
    }

    #[test]
    fn good_identity_passes() {
        IdentityRequirements::default()
            .check("jo.smith", "Jo Smith")
            .unwrap();
    }

    #[test]
    fn sanitize_trims_unicode_whitespace() {
        let account = NewAccount::new("  jo.smith\t", " Jo Smith \u{2009}", " jo@x.com ").sanitized();
        assert_eq!(account.username, "jo.smith");
        assert_eq!(account.full_name, "Jo Smith");
        assert_eq!(account.email, "jo@x.com");
    }
}
