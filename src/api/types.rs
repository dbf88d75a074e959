use serde::{Deserialize, Serialize};

use crate::db::Account;
use crate::domain::lifecycle::AccessRoute;
use crate::domain::{AccountId, ReviewDecision};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Holding view the client should show instead, for gated requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            redirect: None,
        }
    }

    pub fn redirect(message: impl Into<String>, route: AccessRoute) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            redirect: Some(format!("/{}", route.as_str())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Auth

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub account: Account,
    pub can_access: bool,
    pub route: AccessRoute,
}

impl SessionResponse {
    pub fn of(account: Account) -> Self {
        let state = account.state();
        Self {
            can_access: state.can_access(),
            route: state.route(),
            account,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub account: Account,
    pub verification_sent: bool,
    pub route: AccessRoute,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

// Account

#[derive(Debug, Deserialize)]
pub struct ReactivationRequestBody {
    pub email: String,
    #[serde(default)]
    pub message: String,
}

// Admin

#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<AccountId>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub ids: Vec<AccountId>,
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountListQuery {
    pub role: Option<String>,
    pub verified: Option<bool>,
    pub active: Option<bool>,
    #[serde(default)]
    pub pending_approval: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReactivationListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub notes: String,
}
