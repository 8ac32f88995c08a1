use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::voter::Voter};

/// A voter as presented to clients: never includes the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: ApiId,
    pub name: String,
    pub email: String,
    pub voter_id: String,
    pub is_admin: bool,
    pub has_voted: bool,
}

impl From<Voter> for SafeUser {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id.into(),
            name: voter.voter.name,
            email: voter.voter.email,
            voter_id: voter.voter.voter_id,
            is_admin: voter.voter.is_admin,
            has_voted: voter.voter.has_voted,
        }
    }
}
