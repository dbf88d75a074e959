use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::types::{
    ChangePasswordRequest, EmailRequest, LoginRequest, MessageResponse,
    PasswordResetConfirmRequest, SessionResponse, SignupResponse, TokenRequest,
};
use super::validation::validate_token;
use super::{ApiError, ApiResponse, AppState};
use crate::db::Account;
use crate::domain::lifecycle::AccessRoute;
use crate::domain::{AccountId, Role};
use crate::services::{RegisterRequest, VerifyOutcome};

/// Session key holding the signed-in account id.
pub const SESSION_ACCOUNT_KEY: &str = "account_id";

/// The signed-in account, loaded fresh by [`auth_middleware`] on every request.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Requires a session and loads its account. Sessions of deleted accounts
/// are flushed; inactive accounts are turned away.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = session_account_id(&session).await?;

    let Some(account) = state.store().get_account(id).await? else {
        let _ = session.flush().await;
        return Err(ApiError::unauthorized());
    };

    if !account.active {
        let _ = session.flush().await;
        return Err(ApiError::AccessDenied(AccessRoute::Inactive));
    }

    tracing::Span::current().record("user_id", account.id.value());
    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

/// The access gate: verified, active, and approved if a judge. Runs after
/// [`auth_middleware`].
pub async fn require_access(request: Request, next: Next) -> Result<Response, ApiError> {
    let state = current_account(&request)?.state();
    if !state.can_access() {
        return Err(ApiError::AccessDenied(state.route()));
    }
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    if current_account(&request)?.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

fn current_account(request: &Request) -> Result<&Account, ApiError> {
    request
        .extensions()
        .get::<CurrentAccount>()
        .map(|current| &current.0)
        .ok_or_else(ApiError::unauthorized)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Create an account and sign it in. The account starts unverified.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.accounts().register(payload).await?;

    start_session(&session, outcome.account.id).await?;

    let message = if outcome.verification_sent {
        "Account created. Check your email to verify your address."
    } else {
        "Account created, but we could not send the verification email. Please contact support."
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SignupResponse {
            account: outcome.account,
            verification_sent: outcome.verification_sent,
            route: outcome.route,
            message: message.to_string(),
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let account = state
        .accounts()
        .login(&payload.email, &payload.password)
        .await?;

    start_session(&session, account.id).await?;

    Ok(Json(ApiResponse::success(SessionResponse::of(account))))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_account(
    axum::Extension(CurrentAccount(account)): axum::Extension<CurrentAccount>,
) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::success(SessionResponse::of(account)))
}

/// POST /auth/verify
/// Redeem an email-verification link.
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<VerifyOutcome>>, ApiError> {
    let token = validate_token(&payload.token)?;
    let outcome = state.accounts().verify_email(token).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /auth/verify/resend
/// Answers the same whether or not the address is known.
pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts().resend_verification(&payload.email).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "If that address belongs to an unverified account, a new verification link is on its way.",
    ))))
}

/// POST /auth/password-reset
/// Answers the same whether or not the address is known.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts().request_password_reset(&payload.email).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "If that address belongs to an account, a password reset link is on its way.",
    ))))
}

/// POST /auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let token = validate_token(&payload.token)?;
    state
        .accounts()
        .confirm_password_reset(token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated. You can now sign in.",
    ))))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(CurrentAccount(account)): axum::Extension<CurrentAccount>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    state
        .accounts()
        .change_password(account.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, id: AccountId) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    session
        .insert(SESSION_ACCOUNT_KEY, id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// Account id from the session, or 401 if not signed in.
pub async fn session_account_id(session: &Session) -> Result<AccountId, ApiError> {
    session
        .get::<i32>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .map(AccountId::new)
        .ok_or_else(ApiError::unauthorized)
}
