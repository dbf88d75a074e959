use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::{AccountId, ReactivationStatus, TokenPurpose};
use crate::entities::{account_deactivations, profiles, verification_tokens};

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, AccountFilter, DeactivationInput, NewAccount};
pub use repositories::reactivation::ReactivationRequest;
pub use repositories::token::RedeemAttempt;

/// Integrity failures the store reports as typed errors instead of raw
/// constraint text.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email address already in use")]
    DuplicateEmail,

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Maps unique-index violations on the accounts table to their field.
    #[must_use]
    pub fn classify(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                if detail.contains("username") {
                    Self::DuplicateUsername
                } else {
                    Self::DuplicateEmail
                }
            }
            _ => Self::Database(err),
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn reactivation_repo(&self) -> repositories::reactivation::ReactivationRepository {
        repositories::reactivation::ReactivationRepository::new(self.conn.clone())
    }

    // Accounts

    pub async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        self.account_repo().create(new).await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.account_repo().list(filter).await
    }

    pub async fn count_accounts(&self) -> Result<u64> {
        self.account_repo().count().await
    }

    pub async fn verify_account_password(&self, id: AccountId, password: &str) -> Result<bool> {
        self.account_repo().verify_password(id, password).await
    }

    pub async fn update_account_password_hash(
        &self,
        id: AccountId,
        password_hash: String,
    ) -> Result<()> {
        self.account_repo()
            .update_password_hash(id, password_hash)
            .await
    }

    pub async fn touch_last_login(&self, id: AccountId) -> Result<()> {
        self.account_repo().touch_last_login(id).await
    }

    pub async fn update_account_settings(
        &self,
        id: AccountId,
        username: Option<String>,
        email: Option<String>,
    ) -> Result<Account, StoreError> {
        self.account_repo()
            .update_settings(id, username, email)
            .await
    }

    pub async fn mark_account_verified(&self, id: AccountId) -> Result<()> {
        repositories::account::set_verified(&self.conn, id).await
    }

    pub async fn approve_judge(&self, id: AccountId) -> Result<bool> {
        self.account_repo().approve_judge(id).await
    }

    pub async fn set_account_active(&self, id: AccountId, active: bool) -> Result<bool> {
        self.account_repo().set_active(id, active).await
    }

    pub async fn deactivate_and_delete_account(
        &self,
        id: AccountId,
        input: DeactivationInput,
    ) -> Result<account_deactivations::Model, StoreError> {
        self.account_repo().deactivate_and_delete(id, input).await
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<bool, StoreError> {
        self.account_repo().delete(id).await
    }

    // Profiles

    pub async fn get_or_create_profile(&self, id: AccountId) -> Result<profiles::Model> {
        self.account_repo().get_or_create_profile(id).await
    }

    pub async fn save_profile(&self, profile: profiles::ActiveModel) -> Result<profiles::Model> {
        self.account_repo().save_profile(profile).await
    }

    // Tokens

    pub async fn insert_token(
        &self,
        account: &Account,
        purpose: TokenPurpose,
        token: &str,
        expires_at: i64,
    ) -> Result<verification_tokens::Model, DbErr> {
        self.token_repo()
            .insert(account, purpose, token, expires_at)
            .await
    }

    pub async fn purge_unused_tokens(&self, id: AccountId, purpose: TokenPurpose) -> Result<u64> {
        self.token_repo().purge_unused(id, purpose).await
    }

    pub async fn purge_stale_tokens(&self, now: i64) -> Result<u64> {
        self.token_repo().purge_stale(now).await
    }

    pub async fn find_token(&self, token: &str) -> Result<Option<verification_tokens::Model>> {
        self.token_repo().find(token).await
    }

    pub async fn begin_redeem_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: i64,
    ) -> Result<RedeemAttempt, DbErr> {
        self.token_repo().begin_redeem(token, purpose, now).await
    }

    // Reactivation requests

    pub async fn create_reactivation_request(
        &self,
        email: &str,
        message: &str,
    ) -> Result<ReactivationRequest> {
        self.reactivation_repo().create(email, message).await
    }

    pub async fn get_reactivation_request(&self, id: i32) -> Result<Option<ReactivationRequest>> {
        self.reactivation_repo().get(id).await
    }

    pub async fn list_reactivation_requests(
        &self,
        status: Option<ReactivationStatus>,
    ) -> Result<Vec<ReactivationRequest>> {
        self.reactivation_repo().list(status).await
    }

    pub async fn review_reactivation_request(
        &self,
        id: i32,
        status: ReactivationStatus,
        reviewer: AccountId,
        notes: &str,
    ) -> Result<Option<ReactivationRequest>> {
        self.reactivation_repo()
            .review(id, status, reviewer, notes)
            .await
    }
}
