//! Pool construction, schema bootstrap, and the store facade.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use crate::config::Settings;
use crate::error::Error;
use crate::movies::MovieStore;
use crate::tokens::TokenStore;

/// Open a connection pool sized and bounded from settings.
pub async fn connect(settings: &Settings) -> Result<PgPool, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(&settings.database_url)
        .await?;
    Ok(pool)
}

/// Create the movies and tokens tables and their indexes if absent.
/// All statements are idempotent; run at startup.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id BIGSERIAL PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            title TEXT NOT NULL,
            year INTEGER NOT NULL,
            runtime INTEGER NOT NULL,
            genres TEXT[] NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Full-text title search and genre containment both need GIN.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS movies_title_idx
         ON movies USING GIN (to_tsvector('simple', title))",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS movies_genres_idx ON movies USING GIN (genres)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tokens (
            hash BYTEA PRIMARY KEY,
            user_id BIGINT NOT NULL,
            expiry TIMESTAMPTZ NOT NULL,
            scope TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Ping the database under the given deadline.
pub async fn health_check(pool: &PgPool, deadline: Duration) -> Result<(), Error> {
    with_deadline(deadline, sqlx::query("SELECT 1").execute(pool)).await?;
    Ok(())
}

/// Bundles the per-entity stores over one pool.
#[derive(Clone)]
pub struct Store {
    pub movies: MovieStore,
    pub tokens: TokenStore,
}

impl Store {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Store {
        Store {
            movies: MovieStore::new(pool.clone(), statement_timeout),
            tokens: TokenStore::new(pool, statement_timeout),
        }
    }
}

/// Bound a store round trip by the statement deadline. The underlying
/// statement is atomic server-side, so a timed-out write is either fully
/// applied or not applied at all.
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, Error> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => Err(Error::Timeout),
    }
}
