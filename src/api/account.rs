use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::CurrentAccount;
use super::types::ReactivationRequestBody;
use super::{ApiError, ApiResponse, AppState};
use crate::db::ReactivationRequest;
use crate::services::{
    AccountStatus, Dashboard, DeactivationReceipt, DeactivationRequest, ProfileUpdate,
    ProfileView, SettingsOutcome, SettingsUpdate,
};

/// Multipart field names accepted for the profile image.
const IMAGE_FIELDS: &[&str] = &["profile_image", "image", "file"];

/// GET /account/status
/// Lifecycle flags and the view the client should show. Not gated.
pub async fn get_status(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<ApiResponse<AccountStatus>> {
    Json(ApiResponse::success(AccountStatus::of(account)))
}

/// GET /account/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.accounts().dashboard(account.id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// GET /account/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = state.accounts().profile(account.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /account/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = state.accounts().update_profile(account.id, payload).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// POST /account/profile/image
/// Multipart upload; the first image field wins.
pub async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if !field.name().is_some_and(|name| IMAGE_FIELDS.contains(&name)) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(upload_error)?;

        let profile = state
            .accounts()
            .upload_profile_image(account.id, &filename, content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(ApiResponse::success(profile)));
    }

    Err(ApiError::validation("No image file provided"))
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::validation("Image file is too large")
    } else {
        ApiError::validation(format!("Invalid upload: {}", err.body_text()))
    }
}

/// PUT /account/settings
/// Changing the email signs the account back into the verification flow.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<SettingsOutcome>>, ApiError> {
    let outcome = state.accounts().update_settings(account.id, payload).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /account/deactivate
/// Permanently deletes the account and ends the session.
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    session: Session,
    Json(payload): Json<DeactivationRequest>,
) -> Result<Json<ApiResponse<DeactivationReceipt>>, ApiError> {
    let receipt = state.accounts().deactivate(account.id, payload).await?;
    let _ = session.flush().await;
    Ok(Json(ApiResponse::success(receipt)))
}

/// POST /reactivation-requests
/// Public: the requester no longer has an account to sign in with.
pub async fn request_reactivation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReactivationRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request: ReactivationRequest = state
        .accounts()
        .request_reactivation(&payload.email, &payload.message)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(request))))
}
