//! Domain service for administrative account actions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Account, AccountFilter, ReactivationRequest, StoreError};
use crate::domain::lifecycle::ApprovalOutcome;
use crate::domain::{AccountId, ReactivationStatus, ReviewDecision};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Reactivation request not found: {0}")]
    RequestNotFound(i32),

    /// Reactivation requests are reviewed exactly once.
    #[error("Reactivation request {id} was already {status:?}")]
    AlreadyReviewed {
        id: i32,
        status: ReactivationStatus,
    },

    #[error("Only administrators can do this")]
    NotAnAdmin,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => e.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result of approving one judge.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalReport {
    pub account_id: AccountId,
    pub outcome: ApprovalOutcome,
    /// Whether the approval email went out. False for no-op outcomes.
    pub notified: bool,
}

/// Per-unit tally of a bulk action. Units are independent: a failure on one
/// does not undo the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Units whose state changed.
    pub updated: usize,
    /// Units already in the requested state, or not eligible.
    pub skipped: usize,
    pub not_found: Vec<AccountId>,
    /// Units that changed but whose notification failed.
    pub notifications_failed: usize,
    /// Units that failed with an error; their state is unchanged.
    pub failed: Vec<AccountId>,
}

impl BulkOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.not_found.len() + self.failed.len()
    }
}

/// Account row with the profile data admin listings show.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    #[serde(flatten)]
    pub account: Account,
    pub display_name: String,
    pub completion: u8,
    pub pending_approval: bool,
    pub can_access: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub request: ReactivationRequest,
    /// Only attempted for approvals.
    pub notified: bool,
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// Judges that are waiting for approval, newest first.
    async fn pending_judges(&self) -> Result<Vec<AccountSummary>, AdminError>;

    /// Approves a pending judge. Already approved judges and non-judges are
    /// reported as no-op outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::AccountNotFound`] for unknown ids.
    async fn approve_judge(&self, id: AccountId) -> Result<ApprovalReport, AdminError>;

    /// Approves every id independently and reports the tally.
    async fn approve_judges(&self, ids: &[AccountId]) -> Result<BulkOutcome, AdminError>;

    /// Flips `active` on every id independently.
    async fn set_active(&self, ids: &[AccountId], active: bool) -> Result<BulkOutcome, AdminError>;

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountSummary>, AdminError>;

    async fn reactivation_requests(
        &self,
        status: Option<ReactivationStatus>,
    ) -> Result<Vec<ReactivationRequest>, AdminError>;

    /// Moves a pending request to Approved or Denied. Approval notifies the
    /// requester but does not recreate any account.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::AlreadyReviewed`] for terminal requests and
    /// [`AdminError::NotAnAdmin`] if `reviewer` is not an admin.
    async fn review_reactivation(
        &self,
        id: i32,
        reviewer: AccountId,
        review: ReviewRequest,
    ) -> Result<ReviewReport, AdminError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_total_counts_every_unit() {
        let outcome = BulkOutcome {
            updated: 2,
            skipped: 1,
            not_found: vec![AccountId::new(9)],
            notifications_failed: 1,
            failed: vec![],
        };
        // notification failures are a subset of updated
        assert_eq!(outcome.total(), 4);
    }

    #[test]
    fn review_request_notes_default_to_empty() {
        let review: ReviewRequest = serde_json::from_str(r#"{"decision":"deny"}"#).unwrap();
        assert_eq!(review.decision, ReviewDecision::Deny);
        assert!(review.notes.is_empty());
    }
}
