use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{db::candidate::CandidateId, mongodb::Id};

/// Core vote data, as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// Foreign key candidate ID.
    pub candidate_id: CandidateId,
    /// Foreign key voter ID. Unique across the ledger.
    pub voter: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

/// A ledger entry, with its unique ID.
///
/// Votes are only ever inserted or, to undo a failed cast, deleted; never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Vote {
    /// Create a new vote, timestamped now.
    pub fn new(voter: Id, candidate_id: impl Into<CandidateId>) -> Self {
        Self {
            id: Id::new(),
            vote: VoteCore {
                candidate_id: candidate_id.into(),
                voter,
                timestamp: Utc::now(),
            },
        }
    }
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
