use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{common::credential::hash_credential, db::voter::NewVoter};

pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A request to register a new voter. The password is in plaintext and never stored.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub voter_id: String,
    pub password: String,
}

impl Registration {
    /// Check the registration is acceptable, returning a user-facing reason if not.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please provide name".to_string());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!(
                "Name cannot be more than {MAX_NAME_LENGTH} characters"
            ));
        }
        if !is_valid_email(self.email.trim()) {
            return Err("Please provide a valid email".to_string());
        }
        if self.voter_id.trim().is_empty() {
            return Err("Please provide voter ID".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        Ok(())
    }
}

impl TryFrom<Registration> for NewVoter {
    type Error = Error;

    /// Convert a [`Registration`] into a new, non-admin voter by validating it and hashing the
    /// password.
    fn try_from(registration: Registration) -> Result<Self, Self::Error> {
        registration.validate().map_err(Error::bad_request)?;
        Ok(Self {
            name: registration.name.trim().to_string(),
            email: normalize_email(&registration.email),
            voter_id: registration.voter_id.trim().to_string(),
            password_hash: hash_credential(&registration.password)?,
            is_admin: false,
            has_voted: false,
            created_at: Utc::now(),
        })
    }
}

/// Login credentials.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Emails are compared case-insensitively, so they are stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A pragmatic email check: a non-empty local part, a single `@`, and a dotted domain
/// whose labels are non-empty and whose final label is 2 or 3 letters.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let part_ok = |part: &str| {
        !part.is_empty()
            && part.chars().all(|c| word(c) || c == '.' || c == '-')
            && part.starts_with(word)
            && part.ends_with(word)
    };
    if !part_ok(local) || !part_ok(domain) || local.contains("..") || domain.contains("..") {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tld)) => {
            !head.is_empty()
                && (2..=3).contains(&tld.len())
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        for good in [
            "a@b.co",
            "first.last@example.com",
            "under_score@mail-host.org",
            "x@sub.domain.in",
        ] {
            assert!(is_valid_email(good), "{good} should be valid");
        }
        for bad in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@example",
            "user@example.c",
            "user@example.info",
            "user@@example.com",
            "user@exa..mple.com",
            "a..b@example.com",
            ".user@example.com",
            "us er@example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn registration_validation() {
        assert!(Registration::example().validate().is_ok());

        let mut long_name = Registration::example();
        long_name.name = "n".repeat(MAX_NAME_LENGTH + 1);
        assert!(long_name.validate().is_err());

        let mut short_password = Registration::example();
        short_password.password = "12345".to_string();
        assert!(short_password.validate().is_err());

        let mut no_voter_id = Registration::example();
        no_voter_id.voter_id = "   ".to_string();
        assert!(no_voter_id.validate().is_err());
    }

    #[test]
    fn registration_hashes_password() {
        let voter = NewVoter::try_from(Registration {
            email: "  Asha.Patil@Example.com ".to_string(),
            ..Registration::example()
        })
        .unwrap();
        assert_eq!(voter.email, "asha.patil@example.com");
        assert!(!voter.is_admin);
        assert!(!voter.has_voted);
        assert_ne!(voter.password_hash, Registration::example().password);
        assert!(voter.verify_password(Registration::example().password));
    }
}
