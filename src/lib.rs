//! Cinelog data layer: PostgreSQL-backed movie records with
//! optimistic-concurrency updates, safelisted filtered listing, and
//! single-use activation tokens. Transport, routing, and wire formatting
//! are the consumer's job.

pub mod config;
pub mod error;
pub mod filter;
pub mod movies;
pub mod store;
pub mod tokens;
pub mod validator;

pub use config::Settings;
pub use error::Error;
pub use filter::{Filter, Metadata};
pub use movies::{Movie, MovieStore, NewMovie, SORT_SAFELIST};
pub use store::{connect, ensure_tables, health_check, Store};
pub use tokens::{validate_plaintext, Token, TokenStore, SCOPE_ACTIVATION};
pub use validator::{FieldErrors, Validator};
