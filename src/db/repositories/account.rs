use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tokio::task;

use crate::db::StoreError;
use crate::config::SecurityConfig;
use crate::domain::lifecycle::AccountState;
use crate::domain::{AccountId, DeactivationReason, Role};
use crate::entities::{account_deactivations, accounts, profiles, verification_tokens};

/// Account data returned from the repository (without the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub verified: bool,
    pub approved: bool,
    pub active: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    #[must_use]
    pub const fn state(&self) -> AccountState {
        AccountState {
            role: self.role,
            verified: self.verified,
            approved: self.approved,
            active: self.active,
        }
    }

    #[must_use]
    pub const fn can_access(&self) -> bool {
        self.state().can_access()
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::new(model.id),
            email: model.email,
            username: model.username,
            role: model.role,
            verified: model.verified,
            approved: model.approved,
            active: model.active,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields needed to create an account. `email` must already be normalized and
/// `password_hash` already computed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

/// Filter for admin listings.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub role: Option<Role>,
    pub verified: Option<bool>,
    pub active: Option<bool>,
    pub pending_approval: bool,
}

/// Deactivation details written just before the account row is removed.
#[derive(Debug, Clone)]
pub struct DeactivationInput {
    pub reason: DeactivationReason,
    pub feedback: String,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the account and its profile in one transaction.
    ///
    /// Email and username collisions are reported by the unique indexes so that
    /// concurrent registrations have exactly one winner.
    pub async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let state = AccountState::registered(new.role);

        let txn = self.conn.begin().await?;

        let account = accounts::ActiveModel {
            email: Set(new.email),
            username: Set(new.username),
            password_hash: Set(new.password_hash),
            role: Set(new.role),
            verified: Set(state.verified),
            approved: Set(state.approved),
            active: Set(state.active),
            last_login_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(StoreError::classify)?;

        empty_profile(account.id, &now).insert(&txn).await?;

        txn.commit().await?;

        Ok(Account::from(account))
    }

    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Looks up by normalized email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")?;

        Ok(account.map(Account::from))
    }

    pub async fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut query = accounts::Entity::find();

        if let Some(role) = filter.role {
            query = query.filter(accounts::Column::Role.eq(role));
        }
        if let Some(verified) = filter.verified {
            query = query.filter(accounts::Column::Verified.eq(verified));
        }
        if let Some(active) = filter.active {
            query = query.filter(accounts::Column::Active.eq(active));
        }
        if filter.pending_approval {
            query = query
                .filter(accounts::Column::Role.eq(Role::Judge))
                .filter(accounts::Column::Approved.eq(false));
        }

        let rows = query
            .order_by_desc(accounts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        accounts::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count accounts")
    }

    /// Verify password for an account.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, id: AccountId, password: &str) -> Result<bool> {
        let account = accounts::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        verify_password_hash(account.password_hash, password.to_string()).await
    }

    pub async fn update_password_hash(&self, id: AccountId, password_hash: String) -> Result<()> {
        set_password_hash(&self.conn, id, password_hash).await
    }

    pub async fn touch_last_login(&self, id: AccountId) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        accounts::Entity::update_many()
            .col_expr(accounts::Column::LastLoginAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to record login time")?;
        Ok(())
    }

    /// Applies username/email changes. A changed email drops verification.
    pub async fn update_settings(
        &self,
        id: AccountId,
        username: Option<String>,
        email: Option<String>,
    ) -> Result<Account, StoreError> {
        let account = accounts::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        let email_changed = email.as_ref().is_some_and(|e| *e != account.email);
        let next_state = if email_changed {
            Account::from(account.clone()).state().email_changed()
        } else {
            Account::from(account.clone()).state()
        };

        let mut active: accounts::ActiveModel = account.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(email) = email.filter(|_| email_changed) {
            active.email = Set(email);
        }
        active.verified = Set(next_state.verified);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .map_err(StoreError::classify)?;

        Ok(Account::from(updated))
    }

    /// Flips `approved` for a pending judge. Returns false when the row did not
    /// match (not a judge, already approved, or gone).
    pub async fn approve_judge(&self, id: AccountId) -> Result<bool> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Approved, Expr::value(true))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(accounts::Column::Id.eq(id.value()))
            .filter(accounts::Column::Role.eq(Role::Judge))
            .filter(accounts::Column::Approved.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to approve judge")?;

        Ok(result.rows_affected == 1)
    }

    /// Returns false when the account does not exist or already had that flag.
    pub async fn set_active(&self, id: AccountId, active: bool) -> Result<bool> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Active, Expr::value(active))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(accounts::Column::Id.eq(id.value()))
            .filter(accounts::Column::Active.eq(!active))
            .exec(&self.conn)
            .await
            .context("Failed to update account activation")?;

        Ok(result.rows_affected == 1)
    }

    /// Records the deactivation and hard-deletes the account with everything
    /// that hangs off it. Irreversible.
    pub async fn deactivate_and_delete(
        &self,
        id: AccountId,
        input: DeactivationInput,
    ) -> Result<account_deactivations::Model, StoreError> {
        let txn = self.conn.begin().await?;

        let exists = accounts::Entity::find_by_id(id.value()).one(&txn).await?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let record = account_deactivations::ActiveModel {
            account_id: Set(id.value()),
            reason: Set(input.reason),
            feedback: Set(input.feedback),
            deactivated_at: Set(chrono::Utc::now().to_rfc3339()),
            can_reactivate: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        purge_dependents(&txn, id).await?;
        accounts::Entity::delete_by_id(id.value()).exec(&txn).await?;

        txn.commit().await?;

        Ok(record)
    }

    pub async fn delete(&self, id: AccountId) -> Result<bool, StoreError> {
        let txn = self.conn.begin().await?;
        purge_dependents(&txn, id).await?;
        let result = accounts::Entity::delete_by_id(id.value()).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected == 1)
    }

    /// Profile row for the account, created on the spot if it went missing.
    ///
    /// Safe to race: a concurrent insert loses on the unique index and both
    /// callers read the same row.
    pub async fn get_or_create_profile(&self, id: AccountId) -> Result<profiles::Model> {
        if let Some(profile) = find_profile(&self.conn, id).await? {
            return Ok(profile);
        }

        let now = chrono::Utc::now().to_rfc3339();
        profiles::Entity::insert(empty_profile(id.value(), &now))
            .on_conflict(
                OnConflict::column(profiles::Column::AccountId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to create missing profile")?;

        tracing::warn!(account_id = %id, "Profile was missing and has been recreated");

        find_profile(&self.conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile for account {id} vanished after insert"))
    }

    pub async fn save_profile(&self, profile: profiles::ActiveModel) -> Result<profiles::Model> {
        let mut profile = profile;
        profile.updated_at = Set(chrono::Utc::now().to_rfc3339());
        profile
            .update(&self.conn)
            .await
            .context("Failed to update profile")
    }
}

pub(crate) async fn find_profile<C: ConnectionTrait>(
    conn: &C,
    id: AccountId,
) -> Result<Option<profiles::Model>> {
    profiles::Entity::find()
        .filter(profiles::Column::AccountId.eq(id.value()))
        .one(conn)
        .await
        .context("Failed to query profile")
}

pub(crate) async fn set_verified<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<()> {
    accounts::Entity::update_many()
        .col_expr(accounts::Column::Verified, Expr::value(true))
        .col_expr(
            accounts::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().to_rfc3339()),
        )
        .filter(accounts::Column::Id.eq(id.value()))
        .exec(conn)
        .await
        .context("Failed to mark account verified")?;
    Ok(())
}

pub(crate) async fn set_password_hash<C: ConnectionTrait>(
    conn: &C,
    id: AccountId,
    password_hash: String,
) -> Result<()> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
        .col_expr(
            accounts::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().to_rfc3339()),
        )
        .filter(accounts::Column::Id.eq(id.value()))
        .exec(conn)
        .await
        .context("Failed to update password")?;

    if result.rows_affected == 0 {
        anyhow::bail!("Account not found: {id}");
    }
    Ok(())
}

async fn purge_dependents<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<(), StoreError> {
    verification_tokens::Entity::delete_many()
        .filter(verification_tokens::Column::AccountId.eq(id.value()))
        .exec(conn)
        .await?;
    profiles::Entity::delete_many()
        .filter(profiles::Column::AccountId.eq(id.value()))
        .exec(conn)
        .await?;
    account_deactivations::Entity::delete_many()
        .filter(account_deactivations::Column::AccountId.eq(id.value()))
        .exec(conn)
        .await?;
    Ok(())
}

fn empty_profile(account_id: i32, now: &str) -> profiles::ActiveModel {
    profiles::ActiveModel {
        account_id: Set(account_id),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        bio: Set(String::new()),
        profile_image: Set(None),
        phone_number: Set(String::new()),
        date_of_birth: Set(None),
        school_organization: Set(String::new()),
        grade_level: Set(String::new()),
        expertise_area: Set(String::new()),
        years_experience: Set(None),
        created_at: Set(now.to_string()),
        updated_at: Set(now.to_string()),
        ..Default::default()
    }
}

async fn verify_password_hash(password_hash: String, password: String) -> Result<bool> {
    // Run CPU-intensive password verification in a blocking task
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashes off the async runtime.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}
