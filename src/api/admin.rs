use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentAccount;
use super::types::{
    AccountListQuery, IdsRequest, ReactivationListQuery, ReviewBody, SetActiveRequest,
};
use super::validation::{
    parse_reactivation_status, parse_role, validate_account_id, validate_id_list,
    validate_request_id,
};
use super::{ApiError, ApiResponse, AppState};
use crate::db::{AccountFilter, ReactivationRequest};
use crate::services::{AccountSummary, ApprovalReport, BulkOutcome, ReviewReport, ReviewRequest};

/// GET /admin/judges/pending
pub async fn list_pending_judges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountSummary>>>, ApiError> {
    let judges = state.admin().pending_judges().await?;
    Ok(Json(ApiResponse::success(judges)))
}

/// POST /admin/judges/{id}/approve
pub async fn approve_judge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ApprovalReport>>, ApiError> {
    let id = validate_account_id(id)?;
    let report = state.admin().approve_judge(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /admin/judges/approve
pub async fn approve_judges(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IdsRequest>,
) -> Result<Json<ApiResponse<BulkOutcome>>, ApiError> {
    let ids = validate_id_list(&payload.ids)?;
    let outcome = state.admin().approve_judges(ids).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /admin/accounts/active
pub async fn set_accounts_active(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<BulkOutcome>>, ApiError> {
    let ids = validate_id_list(&payload.ids)?;
    let outcome = state.admin().set_active(ids, payload.active).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /admin/accounts?role=&verified=&active=&pending_approval=
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<ApiResponse<Vec<AccountSummary>>>, ApiError> {
    let filter = AccountFilter {
        role: parse_role(query.role.as_deref())?,
        verified: query.verified,
        active: query.active,
        pending_approval: query.pending_approval,
    };
    let accounts = state.admin().list_accounts(filter).await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// GET /admin/reactivation-requests?status=
pub async fn list_reactivation_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReactivationListQuery>,
) -> Result<Json<ApiResponse<Vec<ReactivationRequest>>>, ApiError> {
    let status = parse_reactivation_status(query.status.as_deref())?;
    let requests = state.admin().reactivation_requests(status).await?;
    Ok(Json(ApiResponse::success(requests)))
}

/// POST /admin/reactivation-requests/{id}/review
pub async fn review_reactivation_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(reviewer)): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(payload): Json<ReviewBody>,
) -> Result<Json<ApiResponse<ReviewReport>>, ApiError> {
    let id = validate_request_id(id)?;
    let report = state
        .admin()
        .review_reactivation(
            id,
            reviewer.id,
            ReviewRequest {
                decision: payload.decision,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
