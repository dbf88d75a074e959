//! Single-use, time-boxed tokens for email verification and password reset.

use sea_orm::{DatabaseTransaction, DbErr, SqlErr};
use thiserror::Error;
use tracing::debug;

use crate::constants::tokens::TOKEN_BYTES;
use crate::db::{Account, RedeemAttempt, Store};
use crate::domain::TokenPurpose;
use crate::entities::verification_tokens;

/// Retries on the (astronomically unlikely) event of a token collision.
const MAX_ISSUE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Token expired")]
    Expired,

    #[error("Token already used")]
    AlreadyUsed,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A consumed token whose follow-up transition has not been committed yet.
///
/// The token stays unused unless [`Redemption::commit`] is called, so the
/// caller's state change and the consumption land together.
pub struct Redemption {
    pub txn: DatabaseTransaction,
    pub token: verification_tokens::Model,
    pub account: Account,
}

impl Redemption {
    pub async fn commit(self) -> Result<Account, DbErr> {
        self.txn.commit().await?;
        Ok(self.account)
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    store: Store,
}

impl TokenCodec {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Issues a fresh token bound to the account's current email.
    pub async fn issue(
        &self,
        account: &Account,
        purpose: TokenPurpose,
        ttl: chrono::Duration,
    ) -> Result<String, TokenError> {
        let expires_at = (chrono::Utc::now() + ttl).timestamp();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = generate_token();
            match self
                .store
                .insert_token(account, purpose, &token, expires_at)
                .await
            {
                Ok(_) => {
                    debug!(account_id = %account.id, purpose = purpose.as_str(), "Issued token");
                    return Ok(token);
                }
                Err(e)
                    if attempt < MAX_ISSUE_ATTEMPTS
                        && matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Consumes a token of the given purpose.
    ///
    /// Concurrent redemptions of one token yield exactly one `Ok`.
    pub async fn redeem(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Redemption, TokenError> {
        let now = chrono::Utc::now().timestamp();

        match self.store.begin_redeem_token(token, purpose, now).await? {
            RedeemAttempt::Redeemed {
                txn,
                token,
                account,
            } => Ok(Redemption {
                txn,
                token,
                account,
            }),
            RedeemAttempt::NotFound => Err(TokenError::NotFound),
            RedeemAttempt::Rejected(row) => Err(check_validity(row.used, row.expires_at, now)
                .err()
                .unwrap_or(TokenError::AlreadyUsed)),
        }
    }

    /// Deletes expired and used tokens.
    pub async fn purge_stale(&self) -> anyhow::Result<u64> {
        self.store
            .purge_stale_tokens(chrono::Utc::now().timestamp())
            .await
    }
}

/// Why a stored token cannot be redeemed at `now`, if it cannot.
pub fn check_validity(used: bool, expires_at: i64, now: i64) -> Result<(), TokenError> {
    if used {
        Err(TokenError::AlreadyUsed)
    } else if now >= expires_at {
        Err(TokenError::Expired)
    } else {
        Ok(())
    }
}

/// 64 hex characters from the thread-local CSPRNG.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_BYTES] = rng.random();

    bytes.iter().fold(String::with_capacity(TOKEN_BYTES * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
