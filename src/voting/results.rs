use std::collections::HashMap;

use log::{debug, warn};
use mongodb::{bson::doc, Database};
use rocket::tokio::sync::RwLock;

use super::registry::{compare_ids, CandidateRegistry};
use crate::error::{Error, Result};
use crate::model::{
    api::{
        candidate::CandidateDesc,
        results::{CandidateResult, Dashboard, ElectionResults},
    },
    db::{
        candidate::{Candidate, CandidateId},
        voter::Voter,
    },
    mongodb::Coll,
};

/// Derives results from the ledger on demand. Nothing here is ever stored.
#[derive(Clone)]
pub struct ResultsAggregator {
    registry: CandidateRegistry,
    voters: Coll<Voter>,
}

impl ResultsAggregator {
    pub fn from_db(db: &Database) -> Self {
        Self {
            registry: CandidateRegistry::from_db(db),
            voters: Coll::from_db(db),
        }
    }

    /// Number of voters eligible to vote, i.e. all non-admin accounts.
    pub async fn eligible_voters(&self) -> Result<u64> {
        let count = self
            .voters
            .count_documents(doc! { "is_admin": false }, None)
            .await?;
        Ok(count)
    }

    pub async fn compute_results(&self) -> Result<ElectionResults> {
        let candidates = self.registry.list().await?;
        let counts = self.registry.vote_counts().await?;
        let eligible = self.eligible_voters().await?;
        Ok(tabulate(candidates, &counts, eligible))
    }

    /// Compute the results, falling back to the last good results if the database cannot be
    /// reached.
    pub async fn compute_results_or_cached(&self, cache: &ResultsCache) -> Result<ElectionResults> {
        match self.compute_results().await {
            Ok(results) => {
                cache.store(results.clone()).await;
                Ok(results)
            }
            Err(Error::PersistenceUnavailable(err)) => {
                warn!("Serving cached results, database unavailable: {err}");
                Ok(cache.latest().await.unwrap_or_default())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn compute_dashboard(&self) -> Result<Dashboard> {
        let results = self.compute_results().await?;
        let registered_voters = self.eligible_voters().await?;
        let voters_voted = self
            .voters
            .count_documents(doc! { "is_admin": false, "has_voted": true }, None)
            .await?;
        let accounts_flagged_voted = self
            .voters
            .count_documents(doc! { "has_voted": true }, None)
            .await?;
        if accounts_flagged_voted != results.total_votes {
            warn!(
                "{accounts_flagged_voted} accounts flagged as voted but {} votes in the ledger",
                results.total_votes
            );
        }

        Ok(Dashboard {
            results,
            registered_voters,
            voters_voted,
            pending_voters: registered_voters.saturating_sub(voters_voted),
            accounts_flagged_voted,
        })
    }
}

/// Rank candidates by the given vote counts.
///
/// Counts for IDs not in `candidates` are included in the total but attributed to no-one.
pub fn tabulate(
    candidates: Vec<Candidate>,
    counts: &HashMap<CandidateId, u64>,
    eligible_voters: u64,
) -> ElectionResults {
    let total_votes = counts.values().sum();

    let mut lines: Vec<_> = candidates
        .into_iter()
        .map(|candidate| {
            let votes = counts.get(&candidate.id).copied().unwrap_or(0);
            CandidateResult {
                percentage: percentage(votes, total_votes),
                candidate: CandidateDesc::new(candidate, votes),
                winner: false,
            }
        })
        .collect();
    lines.sort_by(|a, b| {
        b.candidate
            .votes
            .cmp(&a.candidate.votes)
            .then_with(|| compare_ids(&a.candidate.id, &b.candidate.id))
    });

    let (winning_candidate, winning_party) = match lines.first_mut() {
        Some(top) if top.candidate.votes > 0 => {
            top.winner = true;
            (
                Some(top.candidate.name.clone()),
                Some(top.candidate.party.clone()),
            )
        }
        _ => (None, None),
    };
    debug!("Tabulated {total_votes} votes for {} candidates", lines.len());

    ElectionResults {
        candidates: lines,
        total_votes,
        turnout_percentage: percentage(total_votes, eligible_voters),
        winning_candidate,
        winning_party,
    }
}

/// `part` as a percentage of `whole`, rounded half-up to one decimal place. Zero if `whole`
/// is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    // Round in integer tenths so exact halves are never lost to binary fractions.
    let (part, whole) = (u128::from(part), u128::from(whole));
    let tenths = (part * 2000 + whole) / (2 * whole);
    tenths as f64 / 10.0
}

/// The most recent successfully computed results.
#[derive(Debug, Default)]
pub struct ResultsCache(RwLock<Option<ElectionResults>>);

impl ResultsCache {
    pub async fn store(&self, results: ElectionResults) {
        *self.0.write().await = Some(results);
    }

    pub async fn latest(&self) -> Option<ElectionResults> {
        self.0.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        db::{
            vote::Vote,
            voter::{NewVoter, VoterCore},
        },
        mongodb::Id,
    };

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::example("1", "Aditya", 0),
            Candidate::example("2", "Bhagavat", 1),
            Candidate::example("3", "Rajesh", 2),
            Candidate::example("4", "Sakshi", 3),
        ]
    }

    fn counts(pairs: &[(&str, u64)]) -> HashMap<CandidateId, u64> {
        pairs.iter().map(|(id, n)| (id.to_string(), *n)).collect()
    }

    #[test]
    fn rounding() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(1, 16), 6.3);
        assert_eq!(percentage(1, 8), 12.5);
        assert_eq!(percentage(0, 5), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn two_one_zero_zero() {
        let results = tabulate(candidates(), &counts(&[("1", 2), ("2", 1)]), 3);

        assert_eq!(results.total_votes, 3);
        assert_eq!(results.turnout_percentage, 100.0);
        let lines: Vec<_> = results
            .candidates
            .iter()
            .map(|c| (c.candidate.id.as_str(), c.candidate.votes, c.percentage, c.winner))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("1", 2, 66.7, true),
                ("2", 1, 33.3, false),
                ("3", 0, 0.0, false),
                ("4", 0, 0.0, false),
            ]
        );
        assert_eq!(results.winning_candidate.as_deref(), Some("Aditya"));
        assert_eq!(
            results.winning_party.as_deref(),
            Some(results.candidates[0].candidate.party.as_str())
        );
    }

    #[test]
    fn no_votes_no_winner() {
        let results = tabulate(candidates(), &HashMap::new(), 10);
        assert_eq!(results.total_votes, 0);
        assert_eq!(results.turnout_percentage, 0.0);
        assert!(results.winning_candidate.is_none());
        assert!(results.winning_party.is_none());
        assert!(results
            .candidates
            .iter()
            .all(|c| c.percentage == 0.0 && !c.winner));
        // Without votes, candidates rank by ID alone.
        let ids: Vec<_> = results.candidates.iter().map(|c| c.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);

        let shuffled = vec![
            Candidate::example("3", "Rajesh", 0),
            Candidate::example("1", "Aditya", 1),
            Candidate::example("2", "Bhagavat", 2),
        ];
        let results = tabulate(shuffled, &HashMap::new(), 0);
        let ids: Vec<_> = results.candidates.iter().map(|c| c.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let results = tabulate(candidates(), &counts(&[("4", 2), ("3", 2), ("1", 1)]), 0);
        let ids: Vec<_> = results.candidates.iter().map(|c| c.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4", "1", "2"]);
        assert!(results.candidates[0].winner);
        assert!(!results.candidates[1].winner);
        assert_eq!(results.winning_candidate.as_deref(), Some("Rajesh"));
    }

    #[test]
    fn numeric_ids_tie_break_numerically() {
        let candidates = vec![
            Candidate::example("10", "Ten", 0),
            Candidate::example("9", "Nine", 1),
        ];
        let results = tabulate(candidates, &counts(&[("10", 1), ("9", 1)]), 2);
        assert_eq!(results.winning_candidate.as_deref(), Some("Nine"));
    }

    #[test]
    fn orphaned_votes_count_towards_total_only() {
        let results = tabulate(candidates(), &counts(&[("1", 1), ("gone", 1)]), 4);
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.turnout_percentage, 50.0);
        assert_eq!(results.candidates[0].percentage, 50.0);
        let attributed: u64 = results.candidates.iter().map(|c| c.candidate.votes).sum();
        assert_eq!(attributed, 1);
    }

    #[test]
    fn percentages_sum_to_about_one_hundred() {
        let results = tabulate(
            candidates(),
            &counts(&[("1", 7), ("2", 5), ("3", 3), ("4", 1)]),
            20,
        );
        let sum: f64 = results.candidates.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.2, "sum was {sum}");
    }

    #[backend_test]
    async fn results_follow_the_ledger(db: Database, voters: Coll<NewVoter>, votes: Coll<Vote>) {
        for n in 1..=4 {
            voters.insert_one(VoterCore::numbered(n), None).await.unwrap();
        }
        for candidate in ["3", "3", "1"] {
            votes
                .insert_one(Vote::new(Id::new(), candidate), None)
                .await
                .unwrap();
        }

        let results = ResultsAggregator::from_db(&db).compute_results().await.unwrap();
        assert_eq!(results.total_votes, 3);
        assert_eq!(results.total_votes, votes.count_documents(None, None).await.unwrap());
        assert_eq!(results.turnout_percentage, 75.0);
        assert_eq!(results.candidates[0].candidate.id, "3");
        assert_eq!(results.candidates[0].percentage, 66.7);
        assert!(results.candidates[0].winner);
    }

    #[backend_test]
    async fn dashboard_counts_voters(db: Database, voters: Coll<NewVoter>) {
        let mut voted = VoterCore::numbered(1);
        voted.has_voted = true;
        voters.insert_one(voted, None).await.unwrap();
        voters.insert_one(VoterCore::numbered(2), None).await.unwrap();

        let dashboard = ResultsAggregator::from_db(&db).compute_dashboard().await.unwrap();
        assert_eq!(dashboard.registered_voters, 2);
        assert_eq!(dashboard.voters_voted, 1);
        assert_eq!(dashboard.pending_voters, 1);
        assert_eq!(dashboard.accounts_flagged_voted, 1);
    }

    #[backend_test]
    async fn cache_serves_last_results_when_unreachable(db: Database, votes: Coll<Vote>) {
        let cache = ResultsCache::default();
        votes
            .insert_one(Vote::new(Id::new(), "2"), None)
            .await
            .unwrap();
        let fresh = ResultsAggregator::from_db(&db)
            .compute_results_or_cached(&cache)
            .await
            .unwrap();
        assert_eq!(fresh.total_votes, 1);

        let unreachable = crate::unreachable_database();
        let aggregator = ResultsAggregator::from_db(&unreachable);

        assert!(matches!(
            aggregator.compute_results().await,
            Err(Error::PersistenceUnavailable(_))
        ));
        let degraded = aggregator.compute_results_or_cached(&cache).await.unwrap();
        assert_eq!(degraded, fresh);

        let empty = aggregator
            .compute_results_or_cached(&ResultsCache::default())
            .await
            .unwrap();
        assert_eq!(empty, ElectionResults::default());
    }
}
