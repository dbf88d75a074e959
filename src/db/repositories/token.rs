use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use super::account::Account;
use crate::domain::{AccountId, TokenPurpose};
use crate::entities::{accounts, verification_tokens};

/// Outcome of a redemption attempt.
pub enum RedeemAttempt {
    /// The token was consumed inside `txn`. Nothing is persisted until the
    /// transaction commits; dropping it leaves the token unused.
    Redeemed {
        txn: DatabaseTransaction,
        token: verification_tokens::Model,
        account: Account,
    },
    /// No token with that value and purpose, or it no longer matches its
    /// account's email.
    NotFound,
    /// The token exists but was not redeemable.
    Rejected(verification_tokens::Model),
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        account: &Account,
        purpose: TokenPurpose,
        token: &str,
        expires_at: i64,
    ) -> Result<verification_tokens::Model, DbErr> {
        verification_tokens::ActiveModel {
            account_id: Set(account.id.value()),
            email: Set(account.email.clone()),
            purpose: Set(purpose),
            token: Set(token.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            expires_at: Set(expires_at),
            used: Set(false),
            used_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
    }

    /// Drops outstanding (unused) tokens of one purpose for an account.
    pub async fn purge_unused(&self, account_id: AccountId, purpose: TokenPurpose) -> Result<u64> {
        let result = verification_tokens::Entity::delete_many()
            .filter(verification_tokens::Column::AccountId.eq(account_id.value()))
            .filter(verification_tokens::Column::Purpose.eq(purpose))
            .filter(verification_tokens::Column::Used.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to purge outstanding tokens")?;

        Ok(result.rows_affected)
    }

    /// Removes tokens that expired before `now` or were already used.
    pub async fn purge_stale(&self, now: i64) -> Result<u64> {
        let result = verification_tokens::Entity::delete_many()
            .filter(
                verification_tokens::Column::ExpiresAt
                    .lte(now)
                    .or(verification_tokens::Column::Used.eq(true)),
            )
            .exec(&self.conn)
            .await
            .context("Failed to purge stale tokens")?;

        Ok(result.rows_affected)
    }

    pub async fn find(&self, token: &str) -> Result<Option<verification_tokens::Model>> {
        verification_tokens::Entity::find()
            .filter(verification_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query token")
    }

    /// Marks the token used if and only if it is unused, unexpired and of the
    /// given purpose.
    ///
    /// The conditional update is the first statement of the transaction, so
    /// concurrent attempts serialize on the write lock and only one of them
    /// sees a matching row.
    pub async fn begin_redeem(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: i64,
    ) -> Result<RedeemAttempt, DbErr> {
        let txn = self.conn.begin().await?;

        let result = verification_tokens::Entity::update_many()
            .col_expr(verification_tokens::Column::Used, Expr::value(true))
            .col_expr(
                verification_tokens::Column::UsedAt,
                Expr::value(Some(chrono::Utc::now().to_rfc3339())),
            )
            .filter(verification_tokens::Column::Token.eq(token))
            .filter(verification_tokens::Column::Purpose.eq(purpose))
            .filter(verification_tokens::Column::Used.eq(false))
            .filter(verification_tokens::Column::ExpiresAt.gt(now))
            .exec(&txn)
            .await?;

        let row = verification_tokens::Entity::find()
            .filter(verification_tokens::Column::Token.eq(token))
            .filter(verification_tokens::Column::Purpose.eq(purpose))
            .one(&txn)
            .await?;

        if result.rows_affected != 1 {
            txn.rollback().await?;
            return Ok(row.map_or(RedeemAttempt::NotFound, RedeemAttempt::Rejected));
        }

        let Some(token) = row else {
            txn.rollback().await?;
            return Ok(RedeemAttempt::NotFound);
        };

        // A token only proves control of the address it was mailed to.
        let Some(account) = accounts::Entity::find_by_id(token.account_id)
            .one(&txn)
            .await?
            .filter(|account| account.email == token.email)
        else {
            txn.rollback().await?;
            return Ok(RedeemAttempt::NotFound);
        };

        Ok(RedeemAttempt::Redeemed {
            txn,
            token,
            account: Account::from(account),
        })
    }
}
