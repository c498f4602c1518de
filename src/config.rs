//! Environment-driven settings. A `.env` file is honored when present.

use std::time::Duration;

use crate::error::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 15 * 60;
const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a caller may wait for a pool connection.
    pub acquire_timeout: Duration,
    /// Idle connections older than this are closed.
    pub idle_timeout: Duration,
    /// Deadline applied to every store round trip.
    pub statement_timeout: Duration,
}

impl Settings {
    /// Read settings from the environment. `DATABASE_URL` is required; the
    /// `CINELOG_DB_*` variables override pool and deadline defaults.
    pub fn from_env() -> Result<Settings, Error> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL must be set".into()))?;
        Ok(Settings {
            database_url,
            max_connections: env_parse("CINELOG_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            acquire_timeout: Duration::from_secs(env_parse(
                "CINELOG_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?),
            idle_timeout: Duration::from_secs(env_parse(
                "CINELOG_DB_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
            )?),
            statement_timeout: Duration::from_secs(env_parse(
                "CINELOG_DB_STATEMENT_TIMEOUT_SECS",
                DEFAULT_STATEMENT_TIMEOUT_SECS,
            )?),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, Error> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key}: expected a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
