use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

use super::ApiResponse;
use crate::domain::lifecycle::AccessRoute;
use crate::services::{AccountError, AdminError};

/// Shown for every token failure so responses do not reveal whether a token
/// existed, expired or was already used.
pub const INVALID_LINK_MESSAGE: &str = "This link is invalid or has expired.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The account is signed in but its lifecycle state keeps it out.
    #[error("Access denied: {}", .0.as_str())]
    AccessDenied(AccessRoute),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::AccessDenied(route) => {
                let body = ApiResponse::<()>::redirect(access_message(*route), *route);
                return (StatusCode::FORBIDDEN, Json(body)).into_response();
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

fn access_message(route: AccessRoute) -> &'static str {
    match route {
        AccessRoute::VerificationSent => "Please verify your email address to continue.",
        AccessRoute::PendingApproval => "Your judge account is waiting for administrator approval.",
        AccessRoute::Inactive => "This account is inactive.",
        AccessRoute::Dashboard => "Access denied.",
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateEmail => {
                ApiError::Conflict("An account with this email already exists.".to_string())
            }
            AccountError::DuplicateUsername => {
                ApiError::Conflict("A user with that username already exists.".to_string())
            }
            AccountError::Token(_) => ApiError::ValidationError(INVALID_LINK_MESSAGE.to_string()),
            AccountError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AccountError::AccessDenied { route } => ApiError::AccessDenied(route),
            AccountError::Validation(msg) => ApiError::ValidationError(msg),
            AccountError::NotFound => ApiError::NotFound("Account not found".to_string()),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::AccountNotFound(id) => ApiError::not_found("Account", id),
            AdminError::RequestNotFound(id) => ApiError::not_found("Reactivation request", id),
            e @ AdminError::AlreadyReviewed { .. } => ApiError::Conflict(e.to_string()),
            e @ AdminError::NotAnAdmin => ApiError::Forbidden(e.to_string()),
            AdminError::Validation(msg) => ApiError::ValidationError(msg),
            AdminError::Database(msg) => ApiError::DatabaseError(msg),
            AdminError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication required".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
