use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

pub mod auth;
pub mod candidates;
pub mod results;
pub mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(candidates::routes());
    routes.extend(voting::routes());
    routes.extend(results::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden, default_catcher]
}

#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody::new("Not authorized, please sign in"))
}

#[catch(403)]
fn forbidden() -> Json<ErrorBody> {
    Json(ErrorBody::new("Not authorized for this action"))
}

/// Keep error bodies JSON even when no route produced one, e.g. for malformed bodies.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    let message = status.reason().unwrap_or("Unknown error");
    (status, Json(ErrorBody::new(message)))
}
