use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

pub mod account;
pub mod admin;
pub mod auth;
mod error;
mod observability;
mod types;
pub mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AccountService, AdminService};
use metrics_exporter_prometheus::PrometheusHandle;

/// Slack for multipart framing on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }

    #[must_use]
    pub fn admin(&self) -> &Arc<dyn AdminService> {
        &self.shared.admin_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (uploads_path, cors_origins, secure_cookies, inactivity_minutes, image_limit) = {
        let config = state.config().read().await;
        (
            config.general.uploads_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
            config.accounts.profile_image_max_bytes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let api_router = Router::new()
        .merge(create_signed_in_router(state.clone(), image_limit))
        .merge(create_gated_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/verify", post(auth::verify_email))
        .route("/auth/verify/resend", post(auth::resend_verification))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .route(
            "/reactivation-requests",
            post(account::request_reactivation),
        )
        .route("/health/live", get(observability::liveness))
        .route("/health/ready", get(observability::readiness))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/media", tower_http::services::ServeDir::new(uploads_path))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(
            cors_layer
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes for any signed-in account, whatever its lifecycle state. Unverified
/// accounts still need these to fix their email or leave.
fn create_signed_in_router(state: Arc<AppState>, image_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_account))
        .route("/auth/password", put(auth::change_password))
        .route("/account/status", get(account::get_status))
        .route(
            "/account/profile",
            get(account::get_profile).put(account::update_profile),
        )
        .route(
            "/account/profile/image",
            post(account::upload_profile_image).layer(DefaultBodyLimit::max(
                image_limit.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/account/settings", put(account::update_settings))
        .route("/account/deactivate", post(account::deactivate))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Routes behind the access gate.
fn create_gated_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/account/dashboard", get(account::get_dashboard))
        .route_layer(middleware::from_fn(auth::require_access))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/judges/pending", get(admin::list_pending_judges))
        .route("/admin/judges/{id}/approve", post(admin::approve_judge))
        .route("/admin/judges/approve", post(admin::approve_judges))
        .route("/admin/accounts", get(admin::list_accounts))
        .route("/admin/accounts/active", post(admin::set_accounts_active))
        .route(
            "/admin/reactivation-requests",
            get(admin::list_reactivation_requests),
        )
        .route(
            "/admin/reactivation-requests/{id}/review",
            post(admin::review_reactivation_request),
        )
        .route("/admin/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn(auth::require_access))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
