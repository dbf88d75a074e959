//! Domain service for the account lifecycle.
//!
//! Handles registration, email verification, login, password changes and
//! resets, settings, profiles and self-service deactivation.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::constants::limits;
use crate::db::{Account, ReactivationRequest, StoreError};
use crate::domain::lifecycle::{AccessRoute, AccountState};
use crate::domain::{AccountId, DeactivationReason, Role};
use crate::services::image::ImageError;
use crate::services::tokens::TokenError;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email address already in use")]
    DuplicateEmail,

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Token error: {0}")]
    Token(TokenError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but its lifecycle state does not allow the action.
    #[error("Access denied: {}", route.as_str())]
    AccessDenied { route: AccessRoute },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            StoreError::NotFound => Self::NotFound,
            StoreError::Database(e) => e.into(),
            StoreError::Other(e) => e.into(),
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Database(e) => e.into(),
            other => Self::Token(other),
        }
    }
}

impl From<ImageError> for AccountError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Io(e) => e.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Registration always creates the account. A failed verification email is
/// reported through `verification_sent` so callers can point the user at
/// support instead of failing the signup.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterOutcome {
    pub account: Account,
    pub verification_sent: bool,
    pub route: AccessRoute,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Verified { account: Account, route: AccessRoute },
    /// Informational: the account had already proven its address.
    AlreadyVerified { account: Account, route: AccessRoute },
}

impl VerifyOutcome {
    #[must_use]
    pub const fn account(&self) -> &Account {
        match self {
            Self::Verified { account, .. } | Self::AlreadyVerified { account, .. } => account,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    pub account: Account,
    pub state: AccountState,
    pub can_access: bool,
    pub route: AccessRoute,
}

impl AccountStatus {
    #[must_use]
    pub fn of(account: Account) -> Self {
        let state = account.state();
        Self {
            can_access: state.can_access(),
            route: state.route(),
            state,
            account,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsOutcome {
    pub account: Account,
    pub email_changed: bool,
    /// Only meaningful when `email_changed`.
    pub verification_sent: bool,
}

/// Partial profile update. `None` leaves a field untouched; an empty string
/// clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub school_organization: Option<String>,
    pub grade_level: Option<String>,
    pub expertise_area: Option<String>,
    pub years_experience: Option<i32>,
}

impl ProfileUpdate {
    /// Names of the fields this update touches.
    #[must_use]
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut mark = |set: bool, name: &'static str| {
            if set {
                fields.push(name);
            }
        };
        mark(self.first_name.is_some(), "first_name");
        mark(self.last_name.is_some(), "last_name");
        mark(self.bio.is_some(), "bio");
        mark(self.phone_number.is_some(), "phone_number");
        mark(self.date_of_birth.is_some(), "date_of_birth");
        mark(self.school_organization.is_some(), "school_organization");
        mark(self.grade_level.is_some(), "grade_level");
        mark(self.expertise_area.is_some(), "expertise_area");
        mark(self.years_experience.is_some(), "years_experience");
        fields
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub account_id: AccountId,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub display_name: String,
    pub bio: String,
    pub profile_image: Option<String>,
    pub phone_number: String,
    pub date_of_birth: Option<String>,
    pub school_organization: String,
    pub grade_level: String,
    pub expertise_area: String,
    pub years_experience: Option<i32>,
    pub completion: u8,
    pub is_profile_complete: bool,
    pub visible_fields: Vec<&'static str>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub account: Account,
    pub display_name: String,
    pub role_label: &'static str,
    pub completion: u8,
    pub is_profile_complete: bool,
    pub member_since: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeactivationRequest {
    /// Must be true: deactivation permanently deletes the account.
    #[serde(default)]
    pub confirm: bool,
    pub password: String,
    #[serde(default)]
    pub reason: DeactivationReason,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeactivationReceipt {
    pub email: String,
    pub reason: DeactivationReason,
    pub deactivated_at: String,
    pub notification_sent: bool,
}

/// Domain service trait for the account lifecycle.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an unverified account with its profile and mails a
    /// verification link.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::DuplicateEmail`] or
    /// [`AccountError::DuplicateUsername`] on collisions.
    async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, AccountError>;

    /// Creates an admin that is verified from the start. Used for
    /// bootstrapping, bypasses the signup role policy.
    async fn provision_admin(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AccountError>;

    /// Redeems an email-verification token.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Token`] for unknown, expired or spent tokens.
    async fn verify_email(&self, token: &str) -> Result<VerifyOutcome, AccountError>;

    /// Issues a new verification link, replacing outstanding ones. Unknown or
    /// already verified addresses are ignored.
    async fn resend_verification(&self, email: &str) -> Result<(), AccountError>;

    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] on a bad email/password
    /// pair and [`AccountError::AccessDenied`] for inactive accounts.
    async fn login(&self, email: &str, password: &str) -> Result<Account, AccountError>;

    async fn account(&self, id: AccountId) -> Result<Account, AccountError>;

    async fn status(&self, id: AccountId) -> Result<AccountStatus, AccountError>;

    async fn change_password(
        &self,
        id: AccountId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Mails a reset link if the address belongs to an active account.
    /// Always succeeds from the caller's point of view.
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Changing the email drops verification and starts a new verification
    /// cycle.
    async fn update_settings(
        &self,
        id: AccountId,
        update: SettingsUpdate,
    ) -> Result<SettingsOutcome, AccountError>;

    async fn profile(&self, id: AccountId) -> Result<ProfileView, AccountError>;

    async fn update_profile(
        &self,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<ProfileView, AccountError>;

    async fn upload_profile_image(
        &self,
        id: AccountId,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<ProfileView, AccountError>;

    /// # Errors
    ///
    /// Returns [`AccountError::AccessDenied`] with the holding route when the
    /// account fails the access gate.
    async fn dashboard(&self, id: AccountId) -> Result<Dashboard, AccountError>;

    /// Permanently deletes the account and everything attached to it.
    async fn deactivate(
        &self,
        id: AccountId,
        request: DeactivationRequest,
    ) -> Result<DeactivationReceipt, AccountError>;

    /// Files a reactivation request for review. Does not restore anything.
    async fn request_reactivation(
        &self,
        email: &str,
        message: &str,
    ) -> Result<ReactivationRequest, AccountError>;
}

static EMAIL_RE: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

static USERNAME_RE: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"^[\w.@+-]+$").ok());

pub fn check_email(email: &str) -> Result<(), AccountError> {
    let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email));
    if !valid || email.len() > 254 {
        return Err(AccountError::Validation(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

pub fn check_username(username: &str) -> Result<(), AccountError> {
    if username.is_empty() {
        return Err(AccountError::Validation(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.chars().count() > limits::MAX_USERNAME_CHARS {
        return Err(AccountError::Validation(format!(
            "Username must be {} characters or less",
            limits::MAX_USERNAME_CHARS
        )));
    }
    if !USERNAME_RE.as_ref().is_some_and(|re| re.is_match(username)) {
        return Err(AccountError::Validation(
            "Username may contain only letters, numbers, and @/./+/-/_".to_string(),
        ));
    }
    Ok(())
}

/// Password rules applied to every new password.
pub fn check_password_policy(
    password: &str,
    min_length: usize,
    username: &str,
    email: &str,
) -> Result<(), AccountError> {
    if password.chars().count() < min_length {
        return Err(AccountError::Validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccountError::Validation(
            "Password cannot be entirely numeric".to_string(),
        ));
    }

    let lowered = password.to_lowercase();
    let local_part = email.split('@').next().unwrap_or_default().to_lowercase();
    if lowered == username.to_lowercase() || (!local_part.is_empty() && lowered == local_part) {
        return Err(AccountError::Validation(
            "Password is too similar to your username or email".to_string(),
        ));
    }

    Ok(())
}

pub fn check_max_chars(field: &str, value: &str, max: usize) -> Result<(), AccountError> {
    if value.chars().count() > max {
        return Err(AccountError::Validation(format!(
            "{field} must be {max} characters or less"
        )));
    }
    Ok(())
}
