//! Opaque single-use tokens: generation, hash-only persistence, revocation.
//!
//! The plaintext exists only on the [`Token`] returned at issuance; the
//! store keeps nothing but its SHA-256 digest.

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::time::Duration;

use crate::error::Error;
use crate::store::with_deadline;
use crate::validator::Validator;

/// Scope for account-activation tokens.
pub const SCOPE_ACTIVATION: &str = "activation";

/// Random bytes drawn per token.
const RANDOM_BYTES: usize = 16;

/// Length of the base-32 plaintext derived from [`RANDOM_BYTES`] bytes.
pub const PLAINTEXT_LENGTH: usize = 26;

#[derive(Debug, Clone)]
pub struct Token {
    /// Handed to the caller exactly once; never persisted and not
    /// recoverable afterwards.
    pub plaintext: String,
    /// SHA-256 digest of the plaintext; the only form that is stored.
    pub hash: Vec<u8>,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    /// Namespace tag partitioning tokens by purpose.
    pub scope: String,
}

impl Token {
    /// Draw 16 bytes from the OS random source and derive the plaintext and
    /// its digest. Fails only when the random source itself is unavailable,
    /// which no caller can recover from.
    pub fn generate(user_id: i64, ttl: Duration, scope: &str) -> Result<Token, Error> {
        let mut bytes = [0u8; RANDOM_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RandomSource)?;
        let plaintext = BASE32_NOPAD.encode(&bytes);
        let hash = hash_plaintext(&plaintext);
        Ok(Token {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope: scope.to_string(),
        })
    }
}

/// SHA-256 digest of a plaintext; shared by issuance and lookup.
fn hash_plaintext(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Shape check only; no store lookup.
pub fn validate_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == PLAINTEXT_LENGTH,
        "token",
        "must be 26 bytes long",
    );
}

/// Persistence for tokens, keyed by hash. Safe to clone into any number of
/// tasks; holds no state beyond the pool and the per-statement deadline.
#[derive(Clone)]
pub struct TokenStore {
    pool: PgPool,
    deadline: Duration,
}

impl TokenStore {
    pub fn new(pool: PgPool, deadline: Duration) -> TokenStore {
        TokenStore { pool, deadline }
    }

    /// Generate and persist a token. The returned value is the caller's only
    /// chance to read the plaintext; transmit it immediately.
    pub async fn issue(&self, user_id: i64, ttl: Duration, scope: &str) -> Result<Token, Error> {
        let token = Token::generate(user_id, ttl, scope)?;
        self.insert(&token).await?;
        Ok(token)
    }

    pub async fn insert(&self, token: &Token) -> Result<(), Error> {
        let sql = "INSERT INTO tokens (hash, user_id, expiry, scope)
                   VALUES ($1, $2, $3, $4)";
        tracing::debug!(sql = %sql, user_id = token.user_id, scope = %token.scope, "insert token");
        with_deadline(
            self.deadline,
            sqlx::query(sql)
                .bind(&token.hash)
                .bind(token.user_id)
                .bind(token.expiry)
                .bind(&token.scope)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    /// Hash the presented plaintext and find the owning user among unexpired
    /// tokens of the given scope. Absent or expired tokens both surface as
    /// [`Error::NotFound`]. Single use is the caller's contract: follow a
    /// successful lookup with [`TokenStore::revoke_all`].
    pub async fn user_id_for(&self, plaintext: &str, scope: &str) -> Result<i64, Error> {
        let hash = hash_plaintext(plaintext);
        let sql = "SELECT user_id FROM tokens
                   WHERE hash = $1 AND scope = $2 AND expiry > now()";
        tracing::debug!(sql = %sql, scope = %scope, "look up token");
        let row: Option<(i64,)> = with_deadline(
            self.deadline,
            sqlx::query_as(sql)
                .bind(&hash)
                .bind(scope)
                .fetch_optional(&self.pool),
        )
        .await?;
        row.map(|(user_id,)| user_id).ok_or(Error::NotFound)
    }

    /// Delete every token held by `user_id` in `scope`, invalidating all
    /// outstanding plaintexts of that class at once.
    pub async fn revoke_all(&self, user_id: i64, scope: &str) -> Result<(), Error> {
        let sql = "DELETE FROM tokens WHERE user_id = $1 AND scope = $2";
        tracing::debug!(sql = %sql, user_id, scope = %scope, "revoke tokens");
        with_deadline(
            self.deadline,
            sqlx::query(sql)
                .bind(user_id)
                .bind(scope)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
