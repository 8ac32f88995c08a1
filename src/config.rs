use chrono::Duration;
use log::{error, info};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    api::candidate::CandidateSpec,
    db::voter::ensure_admin_exists,
    mongodb::{ensure_indexes_exist, Coll},
};
use crate::voting::{CandidateRegistry, ResultsCache};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state,
/// along with the (initially empty) results cache.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        Ok(rocket.manage(config).manage(ResultsCache::default()))
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    db_name: String,
    // secrets
    db_uri: String,
}

/// What to put in a fresh database.
#[derive(Deserialize)]
struct SeedConfig {
    admin_name: String,
    admin_email: String,
    // secrets
    admin_password: String,
    #[serde(default)]
    candidates: Vec<CandidateSpec>,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let figment = rocket.figment();
        let (config, seed) = match figment
            .extract::<DbConfig>()
            .and_then(|db| figment.extract::<SeedConfig>().map(|seed| (db, seed)))
        {
            Ok(configs) => configs,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");

        let client = match MongoClient::with_uri_str(&config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&config.db_name);

        if let Err(e) = prepare_database(&db, seed).await {
            error!("Failed to prepare database '{}': {e}", config.db_name);
            return Err(rocket);
        }
        info!("...database connection online!");

        Ok(rocket.manage(client).manage(db))
    }
}

/// Create indexes, seed the candidates, and make sure someone can administer the election.
async fn prepare_database(db: &Database, seed: SeedConfig) -> Result<()> {
    ensure_indexes_exist(db).await?;

    let seeded = CandidateRegistry::from_db(db).seed(seed.candidates).await?;
    if seeded > 0 {
        info!("Seeded {seeded} new candidates");
    }

    ensure_admin_exists(
        &Coll::from_db(db),
        &seed.admin_name,
        &seed.admin_email,
        &seed.admin_password,
    )
    .await
}
