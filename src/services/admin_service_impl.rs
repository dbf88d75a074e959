//! `SeaORM` implementation of the `AdminService` trait.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::limits;
use crate::db::{Account, AccountFilter, ReactivationRequest, Store};
use crate::domain::lifecycle::ApprovalOutcome;
use crate::domain::profile;
use crate::domain::{AccountId, ReactivationStatus, Role};
use crate::services::account_service_impl::completion_of;
use crate::services::admin_service::{
    AccountSummary, AdminError, AdminService, ApprovalReport, BulkOutcome, ReviewReport,
    ReviewRequest,
};
use crate::services::notifier::{self, NotificationContext, NotificationKind, Notifier};

pub struct SeaOrmAdminService {
    store: Store,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl SeaOrmAdminService {
    #[must_use]
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    fn context(&self, recipient_name: &str) -> NotificationContext {
        NotificationContext {
            site_name: self.config.accounts.site_name.clone(),
            recipient_name: recipient_name.to_string(),
            ..Default::default()
        }
    }

    fn login_link(&self) -> String {
        format!(
            "{}/login",
            self.config.accounts.public_base_url.trim_end_matches('/')
        )
    }

    async fn summarize(&self, account: Account) -> Result<AccountSummary, AdminError> {
        let profile = self.store.get_or_create_profile(account.id).await?;
        let state = account.state();
        Ok(AccountSummary {
            display_name: profile::display_name(
                &profile.first_name,
                &profile.last_name,
                &account.username,
                &account.email,
            ),
            completion: completion_of(account.role, &profile),
            pending_approval: state.is_pending_approval(),
            can_access: state.can_access(),
            account,
        })
    }

    async fn summarize_all(
        &self,
        accounts: Vec<Account>,
    ) -> Result<Vec<AccountSummary>, AdminError> {
        let mut summaries = Vec::with_capacity(accounts.len());
        for account in accounts {
            summaries.push(self.summarize(account).await?);
        }
        Ok(summaries)
    }
}

/// Ids in first-seen order without repeats.
fn unique(ids: &[AccountId]) -> Vec<AccountId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn check_bulk_size(ids: &[AccountId]) -> Result<(), AdminError> {
    if ids.is_empty() {
        return Err(AdminError::Validation("No accounts selected".to_string()));
    }
    if ids.len() > limits::MAX_BULK_IDS {
        return Err(AdminError::Validation(format!(
            "At most {} accounts can be changed at once",
            limits::MAX_BULK_IDS
        )));
    }
    Ok(())
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn pending_judges(&self) -> Result<Vec<AccountSummary>, AdminError> {
        let accounts = self
            .store
            .list_accounts(&AccountFilter {
                pending_approval: true,
                ..Default::default()
            })
            .await?;
        self.summarize_all(accounts).await
    }

    async fn approve_judge(&self, id: AccountId) -> Result<ApprovalReport, AdminError> {
        let account = self
            .store
            .get_account(id)
            .await?
            .ok_or(AdminError::AccountNotFound(id))?;

        let (outcome, _) = account.state().approve();
        if outcome != ApprovalOutcome::Approved {
            info!(account_id = %id, outcome = ?outcome, "Approval was a no-op");
            return Ok(ApprovalReport {
                account_id: id,
                outcome,
                notified: false,
            });
        }

        // Conditional on the row still being a pending judge.
        if !self.store.approve_judge(id).await? {
            return Ok(ApprovalReport {
                account_id: id,
                outcome: ApprovalOutcome::AlreadyApproved,
                notified: false,
            });
        }

        metrics::counter!("judges_approved_total").increment(1);
        info!(account_id = %id, "Judge approved");

        let profile = self.store.get_or_create_profile(id).await?;
        let ctx = NotificationContext {
            link: Some(self.login_link()),
            role: Some(Role::Judge),
            ..self.context(&profile::display_name(
                &profile.first_name,
                &profile.last_name,
                &account.username,
                &account.email,
            ))
        };
        let notified = notifier::dispatch(
            self.notifier.as_ref(),
            NotificationKind::JudgeApproval,
            std::slice::from_ref(&account.email),
            &ctx,
        )
        .await;

        Ok(ApprovalReport {
            account_id: id,
            outcome,
            notified,
        })
    }

    async fn approve_judges(&self, ids: &[AccountId]) -> Result<BulkOutcome, AdminError> {
        check_bulk_size(ids)?;

        let mut outcome = BulkOutcome::default();
        for id in unique(ids) {
            match self.approve_judge(id).await {
                Ok(report) if report.outcome == ApprovalOutcome::Approved => {
                    outcome.updated += 1;
                    if !report.notified {
                        outcome.notifications_failed += 1;
                    }
                }
                Ok(_) => outcome.skipped += 1,
                Err(AdminError::AccountNotFound(id)) => outcome.not_found.push(id),
                Err(e) => {
                    warn!(account_id = %id, error = %e, "Bulk approval failed for account");
                    outcome.failed.push(id);
                }
            }
        }

        info!(
            approved = outcome.updated,
            skipped = outcome.skipped,
            not_found = outcome.not_found.len(),
            failed = outcome.failed.len(),
            notifications_failed = outcome.notifications_failed,
            "Bulk judge approval finished"
        );
        Ok(outcome)
    }

    async fn set_active(&self, ids: &[AccountId], active: bool) -> Result<BulkOutcome, AdminError> {
        check_bulk_size(ids)?;

        let mut outcome = BulkOutcome::default();
        for id in unique(ids) {
            let result = match self.store.get_account(id).await {
                Ok(Some(_)) => self.store.set_account_active(id, active).await,
                Ok(None) => {
                    outcome.not_found.push(id);
                    continue;
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(true) => outcome.updated += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    warn!(account_id = %id, error = %e, "Bulk activation change failed for account");
                    outcome.failed.push(id);
                }
            }
        }

        info!(
            active,
            updated = outcome.updated,
            skipped = outcome.skipped,
            not_found = outcome.not_found.len(),
            failed = outcome.failed.len(),
            "Bulk activation change finished"
        );
        Ok(outcome)
    }

    async fn list_accounts(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<AccountSummary>, AdminError> {
        let accounts = self.store.list_accounts(&filter).await?;
        self.summarize_all(accounts).await
    }

    async fn reactivation_requests(
        &self,
        status: Option<ReactivationStatus>,
    ) -> Result<Vec<ReactivationRequest>, AdminError> {
        Ok(self.store.list_reactivation_requests(status).await?)
    }

    async fn review_reactivation(
        &self,
        id: i32,
        reviewer: AccountId,
        review: ReviewRequest,
    ) -> Result<ReviewReport, AdminError> {
        let is_admin = self
            .store
            .get_account(reviewer)
            .await?
            .is_some_and(|a| a.role == Role::Admin);
        if !is_admin {
            return Err(AdminError::NotAnAdmin);
        }

        let notes = review.notes.trim();
        if notes.chars().count() > limits::MAX_ADMIN_NOTES_CHARS {
            return Err(AdminError::Validation(format!(
                "Admin notes must be {} characters or less",
                limits::MAX_ADMIN_NOTES_CHARS
            )));
        }

        let existing = self
            .store
            .get_reactivation_request(id)
            .await?
            .ok_or(AdminError::RequestNotFound(id))?;
        if existing.status.is_terminal() {
            return Err(AdminError::AlreadyReviewed {
                id,
                status: existing.status,
            });
        }

        let status = ReactivationStatus::from(review.decision);
        let Some(request) = self
            .store
            .review_reactivation_request(id, status, reviewer, notes)
            .await?
        else {
            // Lost a race with another reviewer.
            let current = self
                .store
                .get_reactivation_request(id)
                .await?
                .ok_or(AdminError::RequestNotFound(id))?;
            return Err(AdminError::AlreadyReviewed {
                id,
                status: current.status,
            });
        };

        info!(request_id = id, reviewer = %reviewer, status = ?request.status, "Reactivation request reviewed");

        let notified = if request.status == ReactivationStatus::Approved {
            let ctx = NotificationContext {
                subject_email: Some(request.email.clone()),
                ..self.context("")
            };
            notifier::dispatch(
                self.notifier.as_ref(),
                NotificationKind::ReactivationApproval,
                std::slice::from_ref(&request.email),
                &ctx,
            )
            .await
        } else {
            false
        };

        Ok(ReviewReport { request, notified })
    }
}
