//! Typed errors for the data layer.

use thiserror::Error;

use crate::validator::FieldErrors;

#[derive(Error, Debug)]
pub enum Error {
    /// Row absent, id below 1, or a delete that removed nothing.
    #[error("record not found")]
    NotFound,
    /// The conditional update matched zero rows: the record's version moved
    /// since the caller read it. Re-fetch and retry, or surface the conflict.
    #[error("unable to update the record due to an edit conflict")]
    EditConflict,
    /// One message per violated field, all violations collected.
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    /// The statement deadline expired before the store answered.
    #[error("store operation timed out")]
    Timeout,
    #[error("config: {0}")]
    Config(String),
    /// The OS random source failed; token generation cannot proceed.
    #[error("system random source unavailable")]
    RandomSource,
}
