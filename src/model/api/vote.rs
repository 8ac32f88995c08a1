use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::candidate::CandidateId};

/// Body of a vote cast against a candidate given in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub user_id: ApiId,
}

/// Body of a vote cast naming both voter and candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotRequest {
    pub candidate_id: CandidateId,
    pub user_id: ApiId,
}
