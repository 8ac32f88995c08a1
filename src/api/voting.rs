use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthToken, VoterRole},
            candidate::CandidateDesc,
            vote::{BallotRequest, VoteRequest},
        },
        mongodb::Id,
    },
    voting::VotingService,
};

pub fn routes() -> Vec<Route> {
    routes![vote_for_candidate, cast_ballot]
}

#[post("/candidates/<candidate_id>/vote", data = "<request>", format = "json")]
pub async fn vote_for_candidate(
    candidate_id: &str,
    request: Json<VoteRequest>,
    token: AuthToken<VoterRole>,
    service: VotingService,
) -> Result<Json<CandidateDesc>> {
    let voter_id = signed_in_as(&token, request.user_id.into())?;
    let candidate = service.cast_vote(voter_id, candidate_id).await?;
    Ok(Json(candidate))
}

#[post("/votes", data = "<ballot>", format = "json")]
pub async fn cast_ballot(
    ballot: Json<BallotRequest>,
    token: AuthToken<VoterRole>,
    service: VotingService,
) -> Result<Json<CandidateDesc>> {
    let voter_id = signed_in_as(&token, ballot.user_id.into())?;
    let candidate = service.cast_vote(voter_id, &ballot.candidate_id).await?;
    Ok(Json(candidate))
}

/// Votes can only be cast by the signed-in voter for themselves.
fn signed_in_as(token: &AuthToken<VoterRole>, user_id: Id) -> Result<Id> {
    if token.id != user_id {
        return Err(Error::Status(
            Status::Forbidden,
            "Cannot vote on behalf of another user".to_string(),
        ));
    }
    Ok(user_id)
}
