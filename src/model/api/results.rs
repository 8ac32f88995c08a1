use serde::{Deserialize, Serialize};

use crate::model::api::candidate::CandidateDesc;

/// One candidate's line in the election results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    #[serde(flatten)]
    pub candidate: CandidateDesc,
    /// Share of all votes, rounded half-up to one decimal place.
    pub percentage: f64,
    pub winner: bool,
}

/// Aggregated election results, recomputed from the ledger on every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    /// All candidates, most votes first.
    pub candidates: Vec<CandidateResult>,
    pub total_votes: u64,
    /// Votes cast as a share of eligible (non-admin) voters, rounded half-up to one decimal
    /// place.
    pub turnout_percentage: f64,
    pub winning_candidate: Option<String>,
    pub winning_party: Option<String>,
}

/// The administrator's view: results plus voter-roll statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub results: ElectionResults,
    /// Registered non-admin voters.
    pub registered_voters: u64,
    /// Registered non-admin voters whose `hasVoted` flag is set.
    pub voters_voted: u64,
    pub pending_voters: u64,
    /// Accounts of any kind flagged as having voted. Equals `totalVotes` unless the flag
    /// and the ledger have diverged.
    pub accounts_flagged_voted: u64,
}
