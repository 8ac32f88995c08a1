use log::{debug, error, info, warn};
use mongodb::{bson::doc, Database};

use super::registry::CandidateRegistry;
use crate::error::{Error, Result};
use crate::logging::ALERTS;
use crate::model::{
    api::candidate::CandidateDesc,
    db::{candidate::Candidate, vote::Vote, voter::Voter},
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// Casts votes, keeping each voter's `has_voted` flag and the ledger in step.
///
/// The unique index on the ledger's voter reference is the final authority on whether a voter
/// has voted; the flag check and ledger lookup only reject repeat votes early.
#[derive(Clone)]
pub struct VotingService {
    voters: Coll<Voter>,
    votes: Coll<Vote>,
    registry: CandidateRegistry,
}

impl VotingService {
    pub fn from_db(db: &Database) -> Self {
        Self {
            voters: Coll::from_db(db),
            votes: Coll::from_db(db),
            registry: CandidateRegistry::from_db(db),
        }
    }

    /// Record `voter_id`'s vote for `candidate_id`, returning the candidate with its updated
    /// vote count.
    ///
    /// On error, nothing has been persisted.
    pub async fn cast_vote(&self, voter_id: Id, candidate_id: &str) -> Result<CandidateDesc> {
        let voter = self
            .voters
            .find_one(voter_id.as_doc(), None)
            .await?
            .ok_or(Error::VoterNotFound(voter_id))?;
        if voter.has_voted {
            debug!("Voter {voter_id} tried to vote again");
            return Err(Error::AlreadyVoted);
        }

        let candidate = self.registry.get(candidate_id).await?;

        if let Some(existing) = self.votes.find_one(doc! { "voter": voter_id }, None).await? {
            warn!(
                "Voter {voter_id} is not flagged as voted but already cast vote {}",
                existing.id
            );
            return Err(Error::AlreadyVoted);
        }

        let vote = Vote::new(voter_id, candidate.id.as_str());
        match self.votes.insert_one(&vote, None).await {
            Ok(_) => {}
            Err(err) if is_duplicate_key_error(&err) => {
                info!("Voter {voter_id} lost a race to cast a second vote");
                return Err(Error::AlreadyVoted);
            }
            Err(err) => return Err(err.into()),
        }

        self.mark_voted_or_roll_back(voter_id, vote.id).await?;
        info!(
            "Voter {voter_id} cast vote {} for candidate {}",
            vote.id, candidate.id
        );

        self.tally_after_cast(candidate, vote.id).await
    }

    /// The candidate with its vote count, read after `vote_id` has been committed.
    async fn tally_after_cast(&self, candidate: Candidate, vote_id: Id) -> Result<CandidateDesc> {
        match self.registry.vote_count(&candidate.id).await {
            Ok(votes) => Ok(CandidateDesc::new(candidate, votes)),
            Err(err) => {
                warn!(
                    "Vote {vote_id} for candidate {} was recorded, but its tally is unavailable: {err}",
                    candidate.id
                );
                Err(err)
            }
        }
    }

    /// Flag the voter as having voted. If that does not change exactly one voter, delete the
    /// vote again and raise an alert.
    pub(crate) async fn mark_voted_or_roll_back(&self, voter_id: Id, vote_id: Id) -> Result<()> {
        let filter = doc! { "_id": voter_id, "has_voted": false };
        let update = doc! { "$set": { "has_voted": true } };
        let modified = match self.voters.update_one(filter, update, None).await {
            Ok(result) => result.modified_count,
            Err(err) => {
                error!("Failed to flag voter {voter_id} as voted: {err}");
                0
            }
        };
        if modified == 1 {
            return Ok(());
        }

        match self.votes.delete_one(vote_id.as_doc(), None).await {
            Ok(result) if result.deleted_count == 1 => error!(
                target: ALERTS,
                "Rolled back vote {vote_id}: voter {voter_id} could not be flagged as voted"
            ),
            Ok(_) => error!(
                target: ALERTS,
                "Vote {vote_id} vanished before it could be rolled back; voter {voter_id} could not be flagged as voted"
            ),
            Err(err) => error!(
                target: ALERTS,
                "FAILED to roll back vote {vote_id} for voter {voter_id}, ledger and voter flags have diverged: {err}"
            ),
        }
        Err(Error::VoteRollback {
            voter: voter_id,
            vote: vote_id,
        })
    }
}
