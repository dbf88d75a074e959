//! Account lifecycle rules.
//!
//! An account's lifecycle is the tuple (verified, approved, active). Only
//! judges may ever sit at `approved == false`. Everything in here is pure so
//! the services can decide a transition before touching the store.

use serde::Serialize;

use super::Role;

/// Where a caller should be sent after an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessRoute {
    Dashboard,
    VerificationSent,
    PendingApproval,
    Inactive,
}

impl AccessRoute {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::VerificationSent => "verification-sent",
            Self::PendingApproval => "pending-approval",
            Self::Inactive => "inactive",
        }
    }
}

/// Snapshot of the lifecycle flags of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountState {
    pub role: Role,
    pub verified: bool,
    pub approved: bool,
    pub active: bool,
}

/// Result of an approval attempt. The no-op variants are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    AlreadyApproved,
    NotAJudge,
}

impl AccountState {
    /// State of a freshly registered account.
    #[must_use]
    pub const fn registered(role: Role) -> Self {
        Self {
            role,
            verified: false,
            approved: !role.requires_approval(),
            active: true,
        }
    }

    /// `active ∧ verified ∧ (role ≠ judge ∨ approved)`
    #[must_use]
    pub const fn can_access(&self) -> bool {
        self.active && self.verified && (!self.role.requires_approval() || self.approved)
    }

    #[must_use]
    pub const fn is_pending_approval(&self) -> bool {
        self.role.requires_approval() && !self.approved
    }

    /// Holding view for an account that fails the access gate.
    #[must_use]
    pub const fn route(&self) -> AccessRoute {
        if !self.active {
            AccessRoute::Inactive
        } else if !self.verified {
            AccessRoute::VerificationSent
        } else if self.is_pending_approval() {
            AccessRoute::PendingApproval
        } else {
            AccessRoute::Dashboard
        }
    }

    #[must_use]
    pub const fn verified(self) -> Self {
        Self {
            verified: true,
            ..self
        }
    }

    /// Email changes drop verification but leave `active` untouched.
    #[must_use]
    pub const fn email_changed(self) -> Self {
        Self {
            verified: false,
            ..self
        }
    }

    #[must_use]
    pub const fn with_active(self, active: bool) -> Self {
        Self { active, ..self }
    }

    /// Decides an approval. Returns the next state when the transition applies.
    #[must_use]
    pub const fn approve(self) -> (ApprovalOutcome, Self) {
        if !self.role.requires_approval() {
            (ApprovalOutcome::NotAJudge, self)
        } else if self.approved {
            (ApprovalOutcome::AlreadyApproved, self)
        } else {
            (
                ApprovalOutcome::Approved,
                Self {
                    approved: true,
                    ..self
                },
            )
        }
    }

    /// `approved == false ⇒ role == judge`
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.approved || self.role.requires_approval()
    }
}
