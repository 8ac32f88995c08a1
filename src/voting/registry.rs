use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{debug, info};
use mongodb::{
    bson::{self, doc},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions},
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::{CandidateDesc, CandidateSpec, CandidateUpdate},
    db::{
        candidate::{Candidate, CandidateId},
        vote::Vote,
    },
    mongodb::Coll,
};

/// The fixed set of candidates contesting the election.
///
/// Identity fields never change at runtime; vote counts are always derived from the ledger.
#[derive(Clone)]
pub struct CandidateRegistry {
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
}

/// One row of the grouped vote count.
#[derive(Deserialize)]
struct VoteCount {
    #[serde(rename = "_id")]
    candidate_id: CandidateId,
    count: u64,
}

impl CandidateRegistry {
    pub fn from_db(db: &Database) -> Self {
        Self {
            candidates: Coll::from_db(db),
            votes: Coll::from_db(db),
        }
    }

    /// All candidates, in configuration order.
    pub async fn list(&self) -> Result<Vec<Candidate>> {
        let options = FindOptions::builder()
            .sort(doc! { "order": 1, "_id": 1 })
            .build();
        let candidates = self
            .candidates
            .find(None, options)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    /// The candidate with the given ID.
    pub async fn get(&self, id: &str) -> Result<Candidate> {
        self.candidates
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or_else(|| Error::CandidateNotFound(id.to_string()))
    }

    /// Number of votes in the ledger for the given candidate.
    pub async fn vote_count(&self, id: &str) -> Result<u64> {
        let count = self
            .votes
            .count_documents(doc! { "candidate_id": id }, None)
            .await?;
        Ok(count)
    }

    /// Number of votes in the ledger per candidate ID. Candidates without votes are absent.
    pub async fn vote_counts(&self) -> Result<HashMap<CandidateId, u64>> {
        let pipeline = [doc! {
            "$group": { "_id": "$candidate_id", "count": { "$sum": 1 } }
        }];
        let counts = self
            .votes
            .aggregate(pipeline, None)
            .await?
            .with_type::<VoteCount>()
            .map_ok(|row| (row.candidate_id, row.count))
            .try_collect()
            .await?;
        Ok(counts)
    }

    /// All candidates with their current vote counts, in configuration order.
    pub async fn list_with_votes(&self) -> Result<Vec<CandidateDesc>> {
        let candidates = self.list().await?;
        let counts = self.vote_counts().await?;
        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let votes = counts.get(&candidate.id).copied().unwrap_or(0);
                CandidateDesc::new(candidate, votes)
            })
            .collect())
    }

    /// A single candidate with its current vote count.
    pub async fn get_with_votes(&self, id: &str) -> Result<CandidateDesc> {
        let candidate = self.get(id).await?;
        let votes = self.vote_count(id).await?;
        Ok(CandidateDesc::new(candidate, votes))
    }

    /// Apply an administrative edit to a candidate's descriptive fields.
    pub async fn update(&self, id: &str, update: &CandidateUpdate) -> Result<Candidate> {
        update.validate().map_err(Error::bad_request)?;
        let set = update.to_set_document()?;
        if set.is_empty() {
            return Err(Error::bad_request("No candidate fields to update"));
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .candidates
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?
            .ok_or_else(|| Error::CandidateNotFound(id.to_string()))?;
        info!("Updated candidate {id}");
        Ok(updated)
    }

    /// Insert any configured candidates that are not yet in the registry, returning how many
    /// were inserted.
    ///
    /// Existing candidates keep their (possibly edited) descriptive fields; only their list
    /// position follows the configuration.
    pub async fn seed(&self, specs: Vec<CandidateSpec>) -> Result<u64> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = specs.iter().find(|spec| !seen.insert(spec.id.as_str())) {
            return Err(Error::bad_request(format!(
                "Duplicate candidate ID '{}' in configuration",
                duplicate.id
            )));
        }

        let mut inserted = 0;
        for (order, spec) in specs.into_iter().enumerate() {
            let candidate = spec.into_candidate(order as u32);
            let mut fields = bson::to_document(&candidate.candidate)?;
            fields.remove("order");
            let update = doc! {
                "$setOnInsert": fields,
                "$set": { "order": i64::from(candidate.order) },
            };
            let options = UpdateOptions::builder().upsert(true).build();
            let result = self
                .candidates
                .update_one(doc! { "_id": candidate.id.as_str() }, update, options)
                .await?;
            if result.upserted_id.is_some() {
                debug!("Seeded candidate {}", candidate.id);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Order candidate IDs numerically when both are numbers, otherwise lexically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
