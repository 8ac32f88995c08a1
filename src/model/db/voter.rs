use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use log::{info, warn};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::credential::{hash_credential, verify_credential},
    mongodb::{Coll, Id},
};

/// Registration ID given to the administrator account created at launch.
pub const DEFAULT_ADMIN_VOTER_ID: &str = "ADMIN-0000";

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// Unique voter registration ID, as printed on the voter's card.
    pub voter_id: String,
    /// Argon2-encoded password hash.
    pub password_hash: String,
    pub is_admin: bool,
    /// Set exactly once, by a successful vote cast. Never reset.
    pub has_voted: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl VoterCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        verify_credential(&self.password_hash, password)
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Ensure at least one administrator account exists, creating one with the given
/// details if not.
pub async fn ensure_admin_exists(
    voters: &Coll<NewVoter>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let admins = voters
        .count_documents(doc! { "is_admin": true }, None)
        .await?;
    if admins > 0 {
        return Ok(());
    }

    warn!("No administrator account found, creating '{email}'");
    let admin = NewVoter {
        name: name.to_string(),
        email: email.to_string(),
        voter_id: DEFAULT_ADMIN_VOTER_ID.to_string(),
        password_hash: hash_credential(password)?,
        is_admin: true,
        has_voted: false,
        created_at: Utc::now(),
    };
    voters.insert_one(admin, None).await?;
    info!("Created administrator account '{email}'");
    Ok(())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    pub const EXAMPLE_PASSWORD: &str = "correct horse";

    impl VoterCore {
        /// The `n`th example voter. Distinct `n` give distinct emails and registration IDs.
        pub fn numbered(n: u32) -> Self {
            Self {
                name: format!("Voter {n}"),
                email: format!("voter{n}@example.com"),
                voter_id: format!("VTR{n:06}"),
                password_hash: hash_credential(EXAMPLE_PASSWORD).unwrap(),
                is_admin: false,
                has_voted: false,
                created_at: Utc::now(),
            }
        }

        pub fn example() -> Self {
            Self::numbered(0)
        }

        pub fn admin_example() -> Self {
            Self {
                name: "Test Officer".to_string(),
                email: "officer@example.com".to_string(),
                voter_id: "ADMIN-TEST".to_string(),
                is_admin: true,
                ..Self::numbered(u32::MAX)
            }
        }
    }
}

#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;
