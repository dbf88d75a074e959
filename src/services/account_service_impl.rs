//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::limits;
use crate::db::repositories::account::{hash_password_blocking, set_password_hash, set_verified};
use crate::db::{Account, DeactivationInput, NewAccount, ReactivationRequest, Store};
use crate::domain::lifecycle::{AccessRoute, AccountState};
use crate::domain::profile::{self, CompletionInput, COMPLETE_THRESHOLD};
use crate::domain::{AccountId, Role, TokenPurpose, normalize_email};
use crate::entities::profiles;
use crate::services::account_service::{
    AccountError, AccountService, AccountStatus, Dashboard, DeactivationReceipt,
    DeactivationRequest, ProfileUpdate, ProfileView, RegisterOutcome, RegisterRequest,
    SettingsOutcome, SettingsUpdate, VerifyOutcome, check_email, check_max_chars,
    check_password_policy, check_username,
};
use crate::services::image::ImageService;
use crate::services::notifier::{self, NotificationContext, NotificationKind, Notifier};
use crate::services::tokens::{TokenCodec, TokenError};

pub struct SeaOrmAccountService {
    store: Store,
    tokens: TokenCodec,
    notifier: Arc<dyn Notifier>,
    images: ImageService,
    config: Config,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let images = ImageService::new(
            &config.general.uploads_path,
            config.accounts.profile_image_max_bytes,
        );
        Self {
            tokens: TokenCodec::new(store.clone()),
            store,
            notifier,
            images,
            config,
        }
    }

    async fn load(&self, id: AccountId) -> Result<Account, AccountError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!(
            "{}/{path}?token={token}",
            self.config.accounts.public_base_url.trim_end_matches('/')
        )
    }

    fn context(&self, recipient_name: &str) -> NotificationContext {
        NotificationContext {
            site_name: self.config.accounts.site_name.clone(),
            recipient_name: recipient_name.to_string(),
            ..Default::default()
        }
    }

    async fn display_name(&self, account: &Account) -> String {
        match self.store.get_or_create_profile(account.id).await {
            Ok(p) => profile::display_name(
                &p.first_name,
                &p.last_name,
                &account.username,
                &account.email,
            ),
            Err(_) => account.username.clone(),
        }
    }

    /// Replaces outstanding verification tokens with a fresh one and mails it.
    async fn send_verification(&self, account: &Account) -> bool {
        let ttl_hours = self.config.accounts.verification_token_ttl_hours;

        if let Err(e) = self
            .store
            .purge_unused_tokens(account.id, TokenPurpose::EmailVerification)
            .await
        {
            warn!(account_id = %account.id, error = %e, "Failed to purge old verification tokens");
        }

        let token = match self
            .tokens
            .issue(
                account,
                TokenPurpose::EmailVerification,
                chrono::Duration::hours(ttl_hours),
            )
            .await
        {
            Ok(token) => token,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Failed to issue verification token");
                return false;
            }
        };

        let ctx = NotificationContext {
            link: Some(self.link("verify-email", &token)),
            valid_hours: Some(ttl_hours),
            ..self.context(&account.username)
        };

        notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::Verification,
            std::slice::from_ref(&account.email),
            &ctx,
        )
        .await
    }

    async fn alert_admins_new_judge(&self, account: &Account) -> bool {
        let ctx = NotificationContext {
            subject_email: Some(account.email.clone()),
            subject_username: Some(account.username.clone()),
            role: Some(account.role),
            ..self.context("")
        };

        notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::AdminNewJudgeAlert,
            &self.config.accounts.admin_emails,
            &ctx,
        )
        .await
    }

    /// The account a spent verification token belongs to, if that account is
    /// verified at the same address the token was mailed to.
    async fn verified_owner_of(&self, token: &str) -> Result<Option<Account>, AccountError> {
        let Some(row) = self.store.find_token(token).await? else {
            return Ok(None);
        };
        if row.purpose != TokenPurpose::EmailVerification {
            return Ok(None);
        }

        let account = self
            .store
            .get_account(AccountId::new(row.account_id))
            .await?
            .filter(|a| a.verified && a.email == row.email);

        Ok(account)
    }

    async fn hash(&self, password: &str) -> Result<String, AccountError> {
        Ok(hash_password_blocking(password, &self.config.security).await?)
    }

    fn build_view(account: &Account, profile: &profiles::Model) -> ProfileView {
        let completion = completion_of(account.role, profile);
        ProfileView {
            account_id: account.id,
            email: account.email.clone(),
            username: account.username.clone(),
            role: account.role,
            full_name: profile::full_name(&profile.first_name, &profile.last_name),
            display_name: profile::display_name(
                &profile.first_name,
                &profile.last_name,
                &account.username,
                &account.email,
            ),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            bio: profile.bio.clone(),
            profile_image: profile.profile_image.clone(),
            phone_number: profile.phone_number.clone(),
            date_of_birth: profile.date_of_birth.clone(),
            school_organization: profile.school_organization.clone(),
            grade_level: profile.grade_level.clone(),
            expertise_area: profile.expertise_area.clone(),
            years_experience: profile.years_experience,
            completion,
            is_profile_complete: completion >= COMPLETE_THRESHOLD,
            visible_fields: profile::visible_fields(account.role),
            updated_at: profile.updated_at.clone(),
        }
    }
}

/// Completion percentage of a stored profile.
#[must_use]
pub fn completion_of(role: Role, profile: &profiles::Model) -> u8 {
    profile::completion(&CompletionInput {
        role,
        first_name: &profile.first_name,
        last_name: &profile.last_name,
        bio: &profile.bio,
        phone_number: &profile.phone_number,
        school_organization: &profile.school_organization,
        grade_level: &profile.grade_level,
        expertise_area: &profile.expertise_area,
        years_experience: profile.years_experience,
        has_image: profile.profile_image.as_deref().is_some_and(|p| !p.is_empty()),
    })
}

fn validate_profile_update(role: Role, update: &ProfileUpdate) -> Result<(), AccountError> {
    let visible = profile::visible_fields(role);
    if let Some(field) = update
        .touched_fields()
        .into_iter()
        .find(|f| !visible.contains(f))
    {
        return Err(AccountError::Validation(format!(
            "{field} is not editable for {} accounts",
            role.label().to_lowercase()
        )));
    }

    let text_fields = [
        ("First name", &update.first_name, limits::MAX_NAME_CHARS),
        ("Last name", &update.last_name, limits::MAX_NAME_CHARS),
        ("Bio", &update.bio, limits::MAX_BIO_CHARS),
        ("Phone number", &update.phone_number, limits::MAX_PHONE_CHARS),
        (
            "School/organization",
            &update.school_organization,
            limits::MAX_NAME_CHARS,
        ),
        ("Grade level", &update.grade_level, limits::MAX_NAME_CHARS),
        ("Expertise area", &update.expertise_area, limits::MAX_NAME_CHARS),
    ];
    for (label, value, max) in text_fields {
        if let Some(value) = value {
            check_max_chars(label, value.trim(), max)?;
        }
    }

    if let Some(years) = update.years_experience
        && !(0..=limits::MAX_YEARS_EXPERIENCE).contains(&years)
    {
        return Err(AccountError::Validation(format!(
            "Years of experience must be between 0 and {}",
            limits::MAX_YEARS_EXPERIENCE
        )));
    }

    if let Some(dob) = update.date_of_birth.as_deref().map(str::trim)
        && !dob.is_empty()
    {
        let date = chrono::NaiveDate::parse_from_str(dob, "%Y-%m-%d").map_err(|_| {
            AccountError::Validation("Date of birth must be in YYYY-MM-DD format".to_string())
        })?;
        if date > chrono::Utc::now().date_naive() {
            return Err(AccountError::Validation(
                "Date of birth cannot be in the future".to_string(),
            ));
        }
    }

    Ok(())
}

fn apply_profile_update(profile: profiles::Model, update: ProfileUpdate) -> profiles::ActiveModel {
    let mut active: profiles::ActiveModel = profile.into();
    let text = |v: String| v.trim().to_string();

    if let Some(v) = update.first_name {
        active.first_name = Set(text(v));
    }
    if let Some(v) = update.last_name {
        active.last_name = Set(text(v));
    }
    if let Some(v) = update.bio {
        active.bio = Set(text(v));
    }
    if let Some(v) = update.phone_number {
        active.phone_number = Set(text(v));
    }
    if let Some(v) = update.date_of_birth {
        let v = text(v);
        active.date_of_birth = Set(Some(v).filter(|d| !d.is_empty()));
    }
    if let Some(v) = update.school_organization {
        active.school_organization = Set(text(v));
    }
    if let Some(v) = update.grade_level {
        active.grade_level = Set(text(v));
    }
    if let Some(v) = update.expertise_area {
        active.expertise_area = Set(text(v));
    }
    if let Some(v) = update.years_experience {
        active.years_experience = Set(Some(v));
    }
    active
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, AccountError> {
        let email = normalize_email(&request.email);
        let username = request.username.trim().to_string();

        check_email(&email)?;
        check_username(&username)?;

        if request.role == Role::Admin && !self.config.accounts.allow_admin_signup {
            return Err(AccountError::Validation(
                "Admin accounts cannot be created through signup".to_string(),
            ));
        }

        check_password_policy(
            &request.password,
            self.config.security.min_password_length,
            &username,
            &email,
        )?;

        let password_hash = self.hash(&request.password).await?;

        let account = self
            .store
            .create_account(NewAccount {
                email,
                username,
                role: request.role,
                password_hash,
            })
            .await?;

        metrics::counter!("accounts_registered_total", "role" => account.role.as_str())
            .increment(1);
        info!(account_id = %account.id, role = %account.role, "Account registered");

        let verification_sent = self.send_verification(&account).await;
        if !verification_sent {
            warn!(account_id = %account.id, "Verification email could not be sent at signup");
        }

        if account.role == Role::Judge {
            self.alert_admins_new_judge(&account).await;
        }

        Ok(RegisterOutcome {
            route: account.state().route(),
            account,
            verification_sent,
        })
    }

    async fn provision_admin(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let email = normalize_email(email);
        let username = username.trim().to_string();

        check_email(&email)?;
        check_username(&username)?;
        check_password_policy(
            password,
            self.config.security.min_password_length,
            &username,
            &email,
        )?;

        let password_hash = self.hash(password).await?;
        let account = self
            .store
            .create_account(NewAccount {
                email,
                username,
                role: Role::Admin,
                password_hash,
            })
            .await?;

        self.store.mark_account_verified(account.id).await?;
        info!(account_id = %account.id, "Admin account provisioned");

        self.load(account.id).await
    }

    async fn verify_email(&self, token: &str) -> Result<VerifyOutcome, AccountError> {
        let redemption = match self
            .tokens
            .redeem(token, TokenPurpose::EmailVerification)
            .await
        {
            Ok(redemption) => redemption,
            Err(TokenError::AlreadyUsed) => {
                // A replayed link for an address that is verified is not an error.
                if let Some(account) = self.verified_owner_of(token).await? {
                    return Ok(VerifyOutcome::AlreadyVerified {
                        route: account.state().route(),
                        account,
                    });
                }
                return Err(TokenError::AlreadyUsed.into());
            }
            Err(e) => return Err(e.into()),
        };

        if redemption.account.verified {
            let account = redemption.commit().await?;
            debug!(account_id = %account.id, "Verification token redeemed for verified account");
            return Ok(VerifyOutcome::AlreadyVerified {
                route: account.state().route(),
                account,
            });
        }

        set_verified(&redemption.txn, redemption.account.id).await?;
        let account = redemption.commit().await?;
        let account = Account {
            verified: true,
            ..account
        };

        metrics::counter!("accounts_verified_total", "role" => account.role.as_str()).increment(1);
        info!(account_id = %account.id, role = %account.role, "Email verified");

        let ctx = NotificationContext {
            role: Some(account.role),
            ..self.context(&self.display_name(&account).await)
        };
        notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::Welcome,
            std::slice::from_ref(&account.email),
            &ctx,
        )
        .await;

        Ok(VerifyOutcome::Verified {
            route: account.state().route(),
            account,
        })
    }

    async fn resend_verification(&self, email: &str) -> Result<(), AccountError> {
        let email = normalize_email(email);
        let Some(account) = self.store.get_account_by_email(&email).await? else {
            debug!("Verification resend requested for unknown address");
            return Ok(());
        };

        if account.verified || !account.active {
            debug!(account_id = %account.id, "Verification resend not needed");
            return Ok(());
        }

        if self.send_verification(&account).await {
            info!(account_id = %account.id, "Verification email re-sent");
        }
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let email = normalize_email(email);
        let account = self
            .store
            .get_account_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !self
            .store
            .verify_account_password(account.id, password)
            .await?
        {
            return Err(AccountError::InvalidCredentials);
        }

        if !account.active {
            return Err(AccountError::AccessDenied {
                route: AccessRoute::Inactive,
            });
        }

        self.store.touch_last_login(account.id).await?;
        info!(account_id = %account.id, "User logged in");

        self.load(account.id).await
    }

    async fn account(&self, id: AccountId) -> Result<Account, AccountError> {
        self.load(id).await
    }

    async fn status(&self, id: AccountId) -> Result<AccountStatus, AccountError> {
        Ok(AccountStatus::of(self.load(id).await?))
    }

    async fn change_password(
        &self,
        id: AccountId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let account = self.load(id).await?;

        if current_password == new_password {
            return Err(AccountError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        if !self
            .store
            .verify_account_password(id, current_password)
            .await?
        {
            return Err(AccountError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        check_password_policy(
            new_password,
            self.config.security.min_password_length,
            &account.username,
            &account.email,
        )?;

        let hash = self.hash(new_password).await?;
        self.store.update_account_password_hash(id, hash).await?;

        info!(account_id = %id, "Password changed");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = normalize_email(email);
        let account = match self.store.get_account_by_email(&email).await {
            Ok(Some(account)) if account.active => account,
            Ok(_) => {
                debug!("Password reset requested for unknown or inactive address");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Password reset lookup failed");
                return Ok(());
            }
        };

        let ttl_hours = self.config.accounts.password_reset_token_ttl_hours;

        if let Err(e) = self
            .store
            .purge_unused_tokens(account.id, TokenPurpose::PasswordReset)
            .await
        {
            warn!(account_id = %account.id, error = %e, "Failed to purge old reset tokens");
        }

        let token = match self
            .tokens
            .issue(
                &account,
                TokenPurpose::PasswordReset,
                chrono::Duration::hours(ttl_hours),
            )
            .await
        {
            Ok(token) => token,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Failed to issue reset token");
                return Ok(());
            }
        };

        let ctx = NotificationContext {
            link: Some(self.link("reset-password", &token)),
            valid_hours: Some(ttl_hours),
            ..self.context(&self.display_name(&account).await)
        };
        notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::PasswordReset,
            std::slice::from_ref(&account.email),
            &ctx,
        )
        .await;

        info!(account_id = %account.id, "Password reset requested");
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        // Check the new password against the owner before spending the token,
        // so a rejected password leaves the link usable.
        let owner = match self.store.find_token(token).await? {
            Some(row) if row.purpose == TokenPurpose::PasswordReset => {
                self.store.get_account(AccountId::new(row.account_id)).await?
            }
            _ => None,
        }
        .ok_or(AccountError::Token(TokenError::NotFound))?;

        check_password_policy(
            new_password,
            self.config.security.min_password_length,
            &owner.username,
            &owner.email,
        )?;
        let hash = self.hash(new_password).await?;

        let redemption = self
            .tokens
            .redeem(token, TokenPurpose::PasswordReset)
            .await?;
        let account_id = redemption.account.id;

        set_password_hash(&redemption.txn, account_id, hash).await?;
        redemption.commit().await?;

        if let Err(e) = self
            .store
            .purge_unused_tokens(account_id, TokenPurpose::PasswordReset)
            .await
        {
            warn!(account_id = %account_id, error = %e, "Failed to purge remaining reset tokens");
        }

        info!(account_id = %account_id, "Password reset completed");
        Ok(())
    }

    async fn update_settings(
        &self,
        id: AccountId,
        update: SettingsUpdate,
    ) -> Result<SettingsOutcome, AccountError> {
        let current = self.load(id).await?;

        let username = update.username.map(|u| u.trim().to_string());
        if let Some(username) = &username {
            check_username(username)?;
        }

        let email = update.email.map(|e| normalize_email(&e));
        if let Some(email) = &email {
            check_email(email)?;
        }

        let email_changed = email.as_ref().is_some_and(|e| *e != current.email);
        let username_changed = username.as_ref().is_some_and(|u| *u != current.username);

        if !email_changed && !username_changed {
            return Ok(SettingsOutcome {
                account: current,
                email_changed: false,
                verification_sent: false,
            });
        }

        let account = self
            .store
            .update_account_settings(id, username, email)
            .await?;

        let mut verification_sent = false;
        if email_changed {
            info!(account_id = %id, "Email changed, verification required again");
            verification_sent = self.send_verification(&account).await;
        }

        Ok(SettingsOutcome {
            account,
            email_changed,
            verification_sent,
        })
    }

    async fn profile(&self, id: AccountId) -> Result<ProfileView, AccountError> {
        let account = self.load(id).await?;
        let profile = self.store.get_or_create_profile(id).await?;
        Ok(Self::build_view(&account, &profile))
    }

    async fn update_profile(
        &self,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<ProfileView, AccountError> {
        let account = self.load(id).await?;
        validate_profile_update(account.role, &update)?;

        let profile = self.store.get_or_create_profile(id).await?;
        let saved = self
            .store
            .save_profile(apply_profile_update(profile, update))
            .await?;

        info!(account_id = %id, "Profile updated");
        Ok(Self::build_view(&account, &saved))
    }

    async fn upload_profile_image(
        &self,
        id: AccountId,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<ProfileView, AccountError> {
        let account = self.load(id).await?;
        let extension = self.images.validate(filename, content_type, bytes.len())?;

        let profile = self.store.get_or_create_profile(id).await?;
        let previous = profile.profile_image.clone();

        let stored = self
            .images
            .save_profile_image(id, &extension, bytes)
            .await?;

        let mut active: profiles::ActiveModel = profile.into();
        active.profile_image = Set(Some(stored));
        let saved = self.store.save_profile(active).await?;

        if let Some(previous) = previous.filter(|p| !p.is_empty()) {
            self.images.remove(&previous).await;
        }

        Ok(Self::build_view(&account, &saved))
    }

    async fn dashboard(&self, id: AccountId) -> Result<Dashboard, AccountError> {
        let account = self.load(id).await?;
        let state: AccountState = account.state();
        if !state.can_access() {
            return Err(AccountError::AccessDenied {
                route: state.route(),
            });
        }

        let profile = self.store.get_or_create_profile(id).await?;
        let completion = completion_of(account.role, &profile);

        Ok(Dashboard {
            display_name: profile::display_name(
                &profile.first_name,
                &profile.last_name,
                &account.username,
                &account.email,
            ),
            role_label: account.role.label(),
            completion,
            is_profile_complete: completion >= COMPLETE_THRESHOLD,
            member_since: account.created_at.clone(),
            account,
        })
    }

    async fn deactivate(
        &self,
        id: AccountId,
        request: DeactivationRequest,
    ) -> Result<DeactivationReceipt, AccountError> {
        if !request.confirm {
            return Err(AccountError::Validation(
                "Deactivation permanently deletes your account and must be confirmed".to_string(),
            ));
        }
        let feedback = request.feedback.trim().to_string();
        check_max_chars("Feedback", &feedback, limits::MAX_FEEDBACK_CHARS)?;

        let account = self.load(id).await?;
        if !self
            .store
            .verify_account_password(id, &request.password)
            .await?
        {
            return Err(AccountError::InvalidCredentials);
        }

        let profile = self.store.get_or_create_profile(id).await?;
        let name = profile::display_name(
            &profile.first_name,
            &profile.last_name,
            &account.username,
            &account.email,
        );

        let record = self
            .store
            .deactivate_and_delete_account(
                id,
                DeactivationInput {
                    reason: request.reason,
                    feedback,
                },
            )
            .await?;

        if let Some(image) = profile.profile_image.filter(|p| !p.is_empty()) {
            self.images.remove(&image).await;
        }

        metrics::counter!("accounts_deactivated_total").increment(1);
        warn!(
            account_id = %id,
            email = %account.email,
            reason = request.reason.label(),
            "Account permanently deleted on user request"
        );

        let ctx = NotificationContext {
            message: Some(request.reason.label().to_string()),
            ..self.context(&name)
        };
        let notification_sent = notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::DeactivationConfirmation,
            std::slice::from_ref(&account.email),
            &ctx,
        )
        .await;

        Ok(DeactivationReceipt {
            email: account.email,
            reason: record.reason,
            deactivated_at: record.deactivated_at,
            notification_sent,
        })
    }

    async fn request_reactivation(
        &self,
        email: &str,
        message: &str,
    ) -> Result<ReactivationRequest, AccountError> {
        let email = normalize_email(email);
        check_email(&email)?;

        let message = message.trim();
        check_max_chars(
            "Message",
            message,
            limits::MAX_REACTIVATION_MESSAGE_CHARS,
        )?;

        let request = self
            .store
            .create_reactivation_request(&email, message)
            .await?;
        info!(request_id = request.id, "Reactivation request filed");

        let ctx = NotificationContext {
            subject_email: Some(email.clone()),
            message: Some(message.to_string()).filter(|m| !m.is_empty()),
            ..self.context("")
        };
        notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::AdminReactivationAlert,
            &self.config.accounts.admin_emails,
            &ctx,
        )
        .await;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_row() -> profiles::Model {
        profiles::Model {
            id: 1,
            account_id: 1,
            first_name: "Ada".to_string(),
            last_name: String::new(),
            bio: String::new(),
            profile_image: None,
            phone_number: String::new(),
            date_of_birth: None,
            school_organization: String::new(),
            grade_level: String::new(),
            expertise_area: String::new(),
            years_experience: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn stored_profile_completion() {
        assert_eq!(completion_of(Role::Student, &profile_row()), 16);

        let with_image = profiles::Model {
            profile_image: Some("profile_images/1_abc.png".to_string()),
            ..profile_row()
        };
        assert_eq!(completion_of(Role::Student, &with_image), 28);

        // An empty stored path is not an image.
        let blank_image = profiles::Model {
            profile_image: Some(String::new()),
            ..profile_row()
        };
        assert_eq!(completion_of(Role::Student, &blank_image), 16);
    }

    #[test]
    fn role_specific_fields_are_rejected_for_other_roles() {
        let update = ProfileUpdate {
            expertise_area: Some("Editing".to_string()),
            ..Default::default()
        };
        assert!(validate_profile_update(Role::Judge, &update).is_ok());
        assert!(matches!(
            validate_profile_update(Role::Student, &update),
            Err(AccountError::Validation(_))
        ));
    }

    #[test]
    fn profile_limits() {
        let long_bio = ProfileUpdate {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(validate_profile_update(Role::Student, &long_bio).is_err());

        let years = ProfileUpdate {
            years_experience: Some(51),
            ..Default::default()
        };
        assert!(validate_profile_update(Role::Judge, &years).is_err());

        let future = ProfileUpdate {
            date_of_birth: Some("2999-01-01".to_string()),
            ..Default::default()
        };
        assert!(validate_profile_update(Role::Admin, &future).is_err());

        let cleared = ProfileUpdate {
            date_of_birth: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_profile_update(Role::Admin, &cleared).is_ok());
    }
}
