//! Movie records: model, validation, and store operations.
//!
//! Concurrent edits are detected with a version counter: `update` writes are
//! conditioned on the version the caller read, in a single statement, so two
//! writers racing from the same snapshot cannot both commit.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::time::Duration;

use crate::error::Error;
use crate::filter::{Filter, Metadata};
use crate::store::with_deadline;
use crate::validator::{unique, Validator};

/// Sort values a caller may request when listing movies.
pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

/// A row from the `movies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    /// Runtime in minutes.
    pub runtime: i32,
    pub genres: Vec<String>,
    /// Optimistic-concurrency counter; starts at 1, +1 per committed update.
    pub version: i32,
}

/// The caller-supplied fields for inserting a movie; the store assigns
/// `id`, `created_at`, and the initial `version`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: i32,
    pub genres: Vec<String>,
}

fn validate_fields(v: &mut Validator, title: &str, year: i32, runtime: i32, genres: &[String]) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= 500,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= 1888, "year", "must be greater than 1888");
    v.check(year < Utc::now().year(), "year", "must not be in the future");

    v.check(runtime != 0, "runtime", "must be provided");
    v.check(runtime > 0, "runtime", "must be positive");

    v.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(genres.len() <= 5, "genres", "must not exceed 5 genres");
    v.check(unique(genres), "genres", "must not contain duplicates");
}

impl NewMovie {
    /// Pure field validation; run before [`MovieStore::insert`].
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

impl Movie {
    /// Pure field validation; run before [`MovieStore::update`].
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

/// Listing row carrying the windowed total alongside the movie columns.
#[derive(FromRow)]
struct CountedMovieRow {
    total_records: i64,
    id: i64,
    created_at: DateTime<Utc>,
    title: String,
    year: i32,
    runtime: i32,
    genres: Vec<String>,
    version: i32,
}

impl From<CountedMovieRow> for Movie {
    fn from(row: CountedMovieRow) -> Movie {
        Movie {
            id: row.id,
            created_at: row.created_at,
            title: row.title,
            year: row.year,
            runtime: row.runtime,
            genres: row.genres,
            version: row.version,
        }
    }
}

/// CRUD and listing over the `movies` table. Holds no state beyond the pool
/// and the per-statement deadline; safe to clone into any number of tasks.
#[derive(Clone)]
pub struct MovieStore {
    pool: PgPool,
    deadline: Duration,
}

impl MovieStore {
    pub fn new(pool: PgPool, deadline: Duration) -> MovieStore {
        MovieStore { pool, deadline }
    }

    /// Insert a movie; the store assigns `id`, `created_at`, and `version = 1`.
    pub async fn insert(&self, new: &NewMovie) -> Result<Movie, Error> {
        let sql = format!(
            "INSERT INTO movies (title, year, runtime, genres)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        tracing::debug!(sql = %sql, title = %new.title, "insert movie");
        with_deadline(
            self.deadline,
            sqlx::query_as::<_, Movie>(&sql)
                .bind(&new.title)
                .bind(new.year)
                .bind(new.runtime)
                .bind(&new.genres)
                .fetch_one(&self.pool),
        )
        .await
    }

    /// Fetch one movie by id. Ids below 1 fail without a round trip.
    pub async fn get(&self, id: i64) -> Result<Movie, Error> {
        if id < 1 {
            return Err(Error::NotFound);
        }
        let sql = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        tracing::debug!(sql = %sql, id, "get movie");
        with_deadline(
            self.deadline,
            sqlx::query_as::<_, Movie>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(Error::NotFound)
    }

    /// Write new field values and advance the version in one conditional
    /// statement, matched on both `id` and the version the caller read.
    /// Zero matched rows means another writer got there first; that
    /// surfaces as [`Error::EditConflict`] and is not retried here.
    pub async fn update(&self, movie: &Movie) -> Result<Movie, Error> {
        let sql = format!(
            "UPDATE movies
             SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
             WHERE id = $5 AND version = $6
             RETURNING {COLUMNS}"
        );
        tracing::debug!(sql = %sql, id = movie.id, version = movie.version, "update movie");
        with_deadline(
            self.deadline,
            sqlx::query_as::<_, Movie>(&sql)
                .bind(&movie.title)
                .bind(movie.year)
                .bind(movie.runtime)
                .bind(&movie.genres)
                .bind(movie.id)
                .bind(movie.version)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(Error::EditConflict)
    }

    /// Delete by id. No prior read is made; zero affected rows means the id
    /// never existed or was already gone, reported as [`Error::NotFound`].
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        if id < 1 {
            return Err(Error::NotFound);
        }
        let sql = "DELETE FROM movies WHERE id = $1";
        tracing::debug!(sql = %sql, id, "delete movie");
        let result =
            with_deadline(self.deadline, sqlx::query(sql).bind(id).execute(&self.pool)).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    /// List movies with optional full-text title search and genre
    /// containment, ordered by the filter's safelisted sort column with an
    /// `id ASC` tiebreak so pagination stays stable across pages.
    ///
    /// An empty `title` or `genres` matches everything. The total matching
    /// count rides along as a window aggregate, so the page and its count
    /// come from one round trip.
    pub async fn list(
        &self,
        title: &str,
        genres: &[String],
        filter: &Filter,
    ) -> Result<(Vec<Movie>, Metadata), Error> {
        let sql = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM movies
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND (genres @> $2 OR $2 = '{{}}')
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            filter.sort_column(),
            filter.sort_direction(),
        );
        tracing::debug!(sql = %sql, title = %title, "list movies");
        let rows = with_deadline(
            self.deadline,
            sqlx::query_as::<_, CountedMovieRow>(&sql)
                .bind(title)
                .bind(genres)
                .bind(filter.limit())
                .bind(filter.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let total_records = rows.first().map_or(0, |row| row.total_records);
        let metadata = Metadata::calculate(total_records, filter.page, filter.page_size);
        let movies = rows.into_iter().map(Movie::from).collect();
        Ok((movies, metadata))
    }
}
