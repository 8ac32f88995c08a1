//! The election core: the candidate registry, vote casting, and results aggregation.
//!
//! Each component is a cheap bundle of collection handles and can be taken directly as a
//! request guard.

use mongodb::Database;
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

mod registry;
mod results;
mod service;

pub use registry::CandidateRegistry;
pub use results::{percentage, tabulate, ResultsAggregator, ResultsCache};
pub use service::VotingService;

/// Build the given components from the managed [`Database`].
///
/// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
macro_rules! from_managed_db {
    ($($component:ty),* $(,)?) => {$(
        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $component {
            type Error = ();

            async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let db = req.guard::<&State<Database>>().await.unwrap();
                request::Outcome::Success(<$component>::from_db(db))
            }
        }
    )*};
}

from_managed_db!(CandidateRegistry, VotingService, ResultsAggregator);
