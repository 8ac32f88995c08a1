use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::api::{
        auth::{AdminRole, AuthToken},
        candidate::{CandidateDesc, CandidateUpdate},
    },
    voting::CandidateRegistry,
};

pub fn routes() -> Vec<Route> {
    routes![list_candidates, get_candidate, update_candidate]
}

#[get("/candidates")]
pub async fn list_candidates(registry: CandidateRegistry) -> Result<Json<Vec<CandidateDesc>>> {
    Ok(Json(registry.list_with_votes().await?))
}

#[get("/candidates/<candidate_id>")]
pub async fn get_candidate(
    candidate_id: &str,
    registry: CandidateRegistry,
) -> Result<Json<CandidateDesc>> {
    Ok(Json(registry.get_with_votes(candidate_id).await?))
}

#[put("/candidates/<candidate_id>", data = "<update>", format = "json")]
pub async fn update_candidate(
    _token: AuthToken<AdminRole>,
    candidate_id: &str,
    update: Json<CandidateUpdate>,
    registry: CandidateRegistry,
) -> Result<Json<CandidateDesc>> {
    let candidate = registry.update(candidate_id, &update).await?;
    let votes = registry.vote_count(candidate_id).await?;
    Ok(Json(CandidateDesc::new(candidate, votes)))
}
