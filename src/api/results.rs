use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::api::{
        auth::{AdminRole, AuthToken},
        results::{Dashboard, ElectionResults},
    },
    voting::{ResultsAggregator, ResultsCache},
};

pub fn routes() -> Vec<Route> {
    routes![results, dashboard]
}

#[get("/results")]
pub async fn results(
    aggregator: ResultsAggregator,
    cache: &State<ResultsCache>,
) -> Result<Json<ElectionResults>> {
    Ok(Json(aggregator.compute_results_or_cached(cache).await?))
}

#[get("/admin/dashboard")]
pub async fn dashboard(
    _token: AuthToken<AdminRole>,
    aggregator: ResultsAggregator,
) -> Result<Json<Dashboard>> {
    Ok(Json(aggregator.compute_dashboard().await?))
}
