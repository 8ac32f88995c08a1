use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// Candidate IDs are stable strings taken from configuration.
pub type CandidateId = String;

/// Descriptive candidate data, as stored in the database.
///
/// There is deliberately no vote count here: tallies are always derived from the
/// vote ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub party: String,
    /// The position sought.
    pub position: String,
    pub bio: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifesto: Option<String>,
    /// Display colour, e.g. `#1a365d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Position of this candidate in the configured list; listings follow this order.
    pub order: u32,
}

/// A candidate from the database, with its configured ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
