#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod voting;

pub use config::Config;

/// Build the server from the default configuration sources.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(LoggerFairing)
}

/// A database client for test setup and cleanup.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .unwrap();
    mongodb::Client::with_uri_str(uri).await.unwrap()
}

/// Get the name of a fresh database to use.
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// A database handle whose server never answers: nothing listens on the discard port.
#[cfg(test)]
pub(crate) fn unreachable_database() -> mongodb::Database {
    use mongodb::options::{ClientOptions, ServerAddress};

    let options = ClientOptions::builder()
        .hosts(vec![ServerAddress::Tcp {
            host: "127.0.0.1".to_string(),
            port: Some(9),
        }])
        .server_selection_timeout(std::time::Duration::from_millis(200))
        .build();
    mongodb::Client::with_options(options)
        .unwrap()
        .database("unreachable")
}

/// A server whose database fairing connects to the given database.
#[cfg(test)]
pub(crate) fn rocket_for_db(db_name: &str) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("db_name", db_name));
    assemble(rocket::custom(figment))
}
