mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{Harness, PASSWORD, harness};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use vidjudge::services::NotificationKind;

async fn spawn_app(h: &Harness) -> Router {
    let state = vidjudge::api::create_app_state(Arc::new(h.state.clone()), None);
    vidjudge::api::router(state).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, set_cookie, json)
}

async fn signup(app: &Router, email: &str, username: &str, role: &str) -> (String, Value) {
    let (status, cookie, body) = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": email,
            "username": username,
            "password": PASSWORD,
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (cookie.expect("signup should start a session"), body)
}

#[tokio::test]
async fn test_health_endpoints() {
    let h = harness().await;
    let app = spawn_app(&h).await;

    let (status, _, body) = send(&app, "GET", "/api/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, _, body) = send(&app, "GET", "/api/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let h = harness().await;
    let app = spawn_app(&h).await;

    for uri in ["/api/auth/me", "/api/account/status", "/api/account/dashboard"] {
        let (status, _, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_signup_reports_failed_verification_email() {
    let h = harness().await;
    h.notifier.fail(NotificationKind::Verification);
    let app = spawn_app(&h).await;

    let (cookie, body) = signup(&app, "unlucky@example.com", "unlucky", "student").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["verification_sent"], false);
    assert!(
        body["data"]["message"]
            .as_str()
            .unwrap()
            .contains("contact support")
    );

    // The account exists and the session works despite the failed email.
    let (status, _, body) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"]["email"], "unlucky@example.com");
}

#[tokio::test]
async fn test_student_signup_verify_dashboard() {
    let h = harness().await;
    let app = spawn_app(&h).await;

    let (cookie, body) = signup(&app, "Student@Example.com", "student1", "student").await;
    assert_eq!(body["data"]["account"]["email"], "student@example.com");
    assert_eq!(body["data"]["verification_sent"], true);
    assert_eq!(body["data"]["route"], "verification-sent");

    let (status, _, body) = send(&app, "GET", "/api/account/dashboard", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["redirect"], "/verification-sent");

    // Status is reachable before verification.
    let (status, _, body) = send(&app, "GET", "/api/account/status", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["can_access"], false);

    let token = h
        .notifier
        .last_token(NotificationKind::Verification, "student@example.com");
    let (status, _, body) = send(
        &app,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "verified");
    assert_eq!(body["data"]["route"], "dashboard");

    let (status, _, body) = send(&app, "GET", "/api/account/dashboard", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_label"], "Student");

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "already_verified");
}

#[tokio::test]
async fn test_invalid_links_share_one_message() {
    let h = harness().await;
    let app = spawn_app(&h).await;

    let (malformed, _, malformed_body) = send(
        &app,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "token": "abc" })),
    )
    .await;
    let (unknown, _, unknown_body) = send(
        &app,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "token": "f".repeat(64) })),
    )
    .await;

    assert_eq!(malformed, StatusCode::BAD_REQUEST);
    assert_eq!(unknown, StatusCode::BAD_REQUEST);
    assert_eq!(malformed_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let h = harness().await;
    let app = spawn_app(&h).await;

    signup(&app, "dup@example.com", "first", "student").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "DUP@example.com",
            "username": "second",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_judge_approval_over_http() {
    let h = harness().await;
    let app = spawn_app(&h).await;
    h.admin().await;

    let (judge_cookie, body) = signup(&app, "judge@example.com", "judge1", "judge").await;
    let judge_id = body["data"]["account"]["id"].as_i64().unwrap();
    h.verify("judge@example.com").await;

    let (status, _, body) =
        send(&app, "GET", "/api/account/dashboard", Some(&judge_cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["redirect"], "/pending-approval");

    // Judges cannot reach admin routes.
    let (status, _, _) = send(&app, "GET", "/api/admin/accounts", Some(&judge_cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, admin_cookie, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "root@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin_cookie = admin_cookie.unwrap();

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/judges/pending",
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _, body) = send(
        &app,
        "POST",
        &format!("/api/admin/judges/{judge_id}/approve"),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "approved");

    let (status, _, _) =
        send(&app, "GET", "/api/account/dashboard", Some(&judge_cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/accounts?role=judge",
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["email"], "judge@example.com");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let h = harness().await;
    let app = spawn_app(&h).await;
    signup(&app, "a@example.com", "alice", "student").await;

    let (status, cookie, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn test_password_reset_answers_the_same_for_unknown_addresses() {
    let h = harness().await;
    let app = spawn_app(&h).await;
    signup(&app, "known@example.com", "known", "student").await;

    let (known, _, known_body) = send(
        &app,
        "POST",
        "/api/auth/password-reset",
        None,
        Some(json!({ "email": "known@example.com" })),
    )
    .await;
    let (unknown, _, unknown_body) = send(
        &app,
        "POST",
        "/api/auth/password-reset",
        None,
        Some(json!({ "email": "ghost@example.com" })),
    )
    .await;

    assert_eq!(known, StatusCode::OK);
    assert_eq!(unknown, StatusCode::OK);
    assert_eq!(known_body, unknown_body);
    assert_eq!(h.notifier.of_kind(NotificationKind::PasswordReset).len(), 1);
}

#[tokio::test]
async fn test_deactivation_ends_session() {
    let h = harness().await;
    let app = spawn_app(&h).await;
    let (cookie, _) = signup(&app, "leaving@example.com", "leaving", "student").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/account/deactivate",
        Some(&cookie),
        Some(json!({ "confirm": true, "password": PASSWORD, "reason": "privacy_concerns" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/api/account/status", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/reactivation-requests",
        None,
        Some(json!({ "email": "leaving@example.com", "message": "Changed my mind" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn test_profile_image_upload() {
    let h = harness().await;
    let app = spawn_app(&h).await;
    let (cookie, _) = signup(&app, "pic@example.com", "pic", "student").await;

    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"profile_image\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"\x89PNG\r\n\x1a\nnot-really-pixels");
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/account/profile/image")
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    let stored = json["data"]["profile_image"].as_str().unwrap();
    assert!(stored.starts_with("profile_images/"));
    assert!(stored.ends_with(".png"));
    assert!(json["data"]["completion"].as_u64().unwrap() > 0);
}
