mod common;

use std::sync::Arc;

use common::{ADMIN_EMAIL, PASSWORD, harness, harness_with, test_config};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, sea_query::Expr};
use vidjudge::db::AccountFilter;
use vidjudge::domain::lifecycle::{AccessRoute, ApprovalOutcome};
use vidjudge::domain::{AccountId, DeactivationReason, ReactivationStatus, ReviewDecision, Role};
use vidjudge::entities::{profiles, verification_tokens};
use vidjudge::services::{
    AccountError, AdminError, DeactivationRequest, NotificationKind, ProfileUpdate,
    RegisterRequest, ReviewRequest, SettingsUpdate, TokenError, VerifyOutcome,
};

#[tokio::test]
async fn student_reaches_dashboard_after_verification() {
    let h = harness().await;
    let accounts = &h.state.account_service;

    let outcome = accounts
        .register(RegisterRequest {
            email: "Student@Example.com".to_string(),
            username: "student1".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Student,
        })
        .await
        .unwrap();

    assert_eq!(outcome.account.email, "student@example.com");
    assert!(outcome.verification_sent);
    assert_eq!(outcome.route, AccessRoute::VerificationSent);
    assert!(!outcome.account.verified);
    assert!(outcome.account.approved);

    let denied = accounts.dashboard(outcome.account.id).await;
    assert!(matches!(
        denied,
        Err(AccountError::AccessDenied {
            route: AccessRoute::VerificationSent
        })
    ));

    let account = h.verify("student@example.com").await;
    assert!(account.verified);
    assert!(account.can_access());

    let dashboard = accounts.dashboard(account.id).await.unwrap();
    assert_eq!(dashboard.role_label, "Student");
    assert_eq!(dashboard.display_name, "student1");
    assert!(!dashboard.is_profile_complete);

    assert_eq!(h.notifier.of_kind(NotificationKind::Welcome).len(), 1);
    // Students do not trigger admin alerts.
    assert!(h.notifier.of_kind(NotificationKind::AdminNewJudgeAlert).is_empty());
}

#[tokio::test]
async fn failed_verification_email_still_creates_the_account() {
    let h = harness().await;
    h.notifier.fail(NotificationKind::Verification);

    let outcome = h
        .state
        .account_service
        .register(RegisterRequest {
            email: "unlucky@example.com".to_string(),
            username: "unlucky".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Student,
        })
        .await
        .unwrap();

    assert!(!outcome.verification_sent);
    assert_eq!(outcome.route, AccessRoute::VerificationSent);
    assert_eq!(h.notifier.of_kind(NotificationKind::Verification).len(), 1);

    let stored = h
        .state
        .account_service
        .account(outcome.account.id)
        .await
        .unwrap();
    assert_eq!(stored.email, "unlucky@example.com");
    assert!(!stored.verified);
}

#[tokio::test]
async fn judge_waits_for_admin_approval() {
    let h = harness().await;

    let judge = h.register("judge@example.com", "judge1", Role::Judge).await;
    assert!(!judge.approved);

    let alerts = h.notifier.of_kind(NotificationKind::AdminNewJudgeAlert);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].recipients, vec![ADMIN_EMAIL.to_string()]);
    assert_eq!(alerts[0].context.subject_email.as_deref(), Some("judge@example.com"));

    let judge = h.verify("judge@example.com").await;
    let status = h.state.account_service.status(judge.id).await.unwrap();
    assert!(!status.can_access);
    assert_eq!(status.route, AccessRoute::PendingApproval);

    let pending = h.state.admin_service.pending_judges().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].account.id, judge.id);

    let report = h.state.admin_service.approve_judge(judge.id).await.unwrap();
    assert_eq!(report.outcome, ApprovalOutcome::Approved);
    assert!(report.notified);
    assert_eq!(h.notifier.of_kind(NotificationKind::JudgeApproval).len(), 1);

    let dashboard = h.state.account_service.dashboard(judge.id).await.unwrap();
    assert_eq!(dashboard.role_label, "Judge");

    let again = h.state.admin_service.approve_judge(judge.id).await.unwrap();
    assert_eq!(again.outcome, ApprovalOutcome::AlreadyApproved);
    assert!(!again.notified);
    assert!(h.state.admin_service.pending_judges().await.unwrap().is_empty());
}

#[tokio::test]
async fn approving_a_student_is_a_noop() {
    let h = harness().await;
    let student = h.register_verified("s@example.com", "s1", Role::Student).await;

    let report = h.state.admin_service.approve_judge(student.id).await.unwrap();
    assert_eq!(report.outcome, ApprovalOutcome::NotAJudge);

    let missing = h.state.admin_service.approve_judge(AccountId::new(9999)).await;
    assert!(matches!(missing, Err(AdminError::AccountNotFound(_))));
}

#[tokio::test]
async fn replayed_verification_link_is_informational() {
    let h = harness().await;
    h.register("a@example.com", "a1", Role::Student).await;
    let token = h
        .notifier
        .last_token(NotificationKind::Verification, "a@example.com");

    let first = h.state.account_service.verify_email(&token).await.unwrap();
    assert!(matches!(first, VerifyOutcome::Verified { .. }));

    let second = h.state.account_service.verify_email(&token).await.unwrap();
    assert!(matches!(second, VerifyOutcome::AlreadyVerified { .. }));
    assert_eq!(h.notifier.of_kind(NotificationKind::Welcome).len(), 1);
}

#[tokio::test]
async fn expired_verification_token_is_rejected() {
    let h = harness().await;
    let account = h.register("late@example.com", "late", Role::Student).await;
    let token = h
        .notifier
        .last_token(NotificationKind::Verification, "late@example.com");

    verification_tokens::Entity::update_many()
        .col_expr(
            verification_tokens::Column::ExpiresAt,
            Expr::value(chrono::Utc::now().timestamp() - 60),
        )
        .filter(verification_tokens::Column::Token.eq(token.as_str()))
        .exec(&h.state.store.conn)
        .await
        .unwrap();

    let result = h.state.account_service.verify_email(&token).await;
    assert!(matches!(result, Err(AccountError::Token(TokenError::Expired))));

    let account = h.state.account_service.account(account.id).await.unwrap();
    assert!(!account.verified);

    let unknown = h.state.account_service.verify_email(&"0".repeat(64)).await;
    assert!(matches!(unknown, Err(AccountError::Token(TokenError::NotFound))));
}

#[tokio::test]
async fn resend_replaces_outstanding_verification_tokens() {
    let h = harness().await;
    h.register("r@example.com", "r1", Role::Student).await;
    let first = h
        .notifier
        .last_token(NotificationKind::Verification, "r@example.com");

    h.state
        .account_service
        .resend_verification("R@example.com")
        .await
        .unwrap();
    let second = h
        .notifier
        .last_token(NotificationKind::Verification, "r@example.com");
    assert_ne!(first, second);

    let stale = h.state.account_service.verify_email(&first).await;
    assert!(matches!(stale, Err(AccountError::Token(_))));
    assert!(h.state.account_service.verify_email(&second).await.is_ok());

    // Unknown and verified addresses are ignored without an error.
    let before = h.notifier.of_kind(NotificationKind::Verification).len();
    h.state
        .account_service
        .resend_verification("nobody@example.com")
        .await
        .unwrap();
    h.state
        .account_service
        .resend_verification("r@example.com")
        .await
        .unwrap();
    assert_eq!(h.notifier.of_kind(NotificationKind::Verification).len(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemption_verifies_once() {
    let h = harness().await;
    let account = h.register("race@example.com", "race", Role::Student).await;
    let token = h
        .notifier
        .last_token(NotificationKind::Verification, "race@example.com");

    let service = h.state.account_service.clone();
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let token = token.clone();
            tokio::spawn(async move { service.verify_email(&token).await })
        })
        .collect();

    let mut verified = 0;
    let mut lost = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(VerifyOutcome::Verified { .. }) => verified += 1,
            Ok(VerifyOutcome::AlreadyVerified { .. })
            | Err(AccountError::Token(TokenError::AlreadyUsed | TokenError::NotFound)) => {
                lost += 1;
            }
            Err(other) => panic!("unexpected redemption result: {other}"),
        }
    }

    assert_eq!(verified, 1);
    assert_eq!(lost, 15);
    assert_eq!(h.notifier.of_kind(NotificationKind::Welcome).len(), 1);
    assert!(
        h.state
            .account_service
            .account(account.id)
            .await
            .unwrap()
            .verified
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_password_resets_redeem_once() {
    let h = harness().await;
    h.register_verified("reset-race@example.com", "resetrace", Role::Student).await;
    h.state
        .account_service
        .request_password_reset("reset-race@example.com")
        .await
        .unwrap();
    let token = h
        .notifier
        .last_token(NotificationKind::PasswordReset, "reset-race@example.com");

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let service = Arc::clone(&h.state.account_service);
            let token = token.clone();
            tokio::spawn(async move {
                service
                    .confirm_password_reset(&token, &format!("fresh secret {i}"))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut used = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AccountError::Token(TokenError::AlreadyUsed | TokenError::NotFound)) => used += 1,
            Err(other) => panic!("unexpected reset result: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(used, 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_with_one_email_create_one_account() {
    let h = harness().await;

    let tasks: Vec<_> = (0..6)
        .map(|i| {
            let service = Arc::clone(&h.state.account_service);
            tokio::spawn(async move {
                service
                    .register(RegisterRequest {
                        email: "dup@example.com".to_string(),
                        username: format!("dup{i}"),
                        password: PASSWORD.to_string(),
                        role: Role::Student,
                    })
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AccountError::DuplicateEmail) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, 5);
    assert_eq!(h.state.store.count_accounts().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_username_is_reported() {
    let h = harness().await;
    h.register("one@example.com", "taken", Role::Student).await;

    let result = h
        .state
        .account_service
        .register(RegisterRequest {
            email: "two@example.com".to_string(),
            username: "taken".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Judge,
        })
        .await;
    assert!(matches!(result, Err(AccountError::DuplicateUsername)));
}

#[tokio::test]
async fn admin_signup_is_refused_by_default() {
    let h = harness().await;
    let result = h
        .state
        .account_service
        .register(RegisterRequest {
            email: "boss@example.com".to_string(),
            username: "boss".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Admin,
        })
        .await;
    assert!(matches!(result, Err(AccountError::Validation(_))));

    let mut config = test_config();
    config.accounts.allow_admin_signup = true;
    let open = harness_with(config).await;
    let outcome = open
        .state
        .account_service
        .register(RegisterRequest {
            email: "boss@example.com".to_string(),
            username: "boss".to_string(),
            password: PASSWORD.to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    assert!(!outcome.account.verified);
    assert!(outcome.account.approved);
}

#[tokio::test]
async fn email_change_requires_new_verification() {
    let h = harness().await;
    let account = h
        .register_verified("old@example.com", "mover", Role::Student)
        .await;

    let outcome = h
        .state
        .account_service
        .update_settings(
            account.id,
            SettingsUpdate {
                username: None,
                email: Some("New@Example.com".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(outcome.email_changed);
    assert!(outcome.verification_sent);
    assert!(!outcome.account.verified);
    assert_eq!(outcome.account.email, "new@example.com");

    let denied = h.state.account_service.dashboard(account.id).await;
    assert!(matches!(
        denied,
        Err(AccountError::AccessDenied {
            route: AccessRoute::VerificationSent
        })
    ));

    let account = h.verify("new@example.com").await;
    assert!(account.verified);

    // Same address again is not a change.
    let unchanged = h
        .state
        .account_service
        .update_settings(
            account.id,
            SettingsUpdate {
                username: Some("mover".to_string()),
                email: Some("new@example.com".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(!unchanged.email_changed);
    assert!(unchanged.account.verified);
}

#[tokio::test]
async fn verification_link_dies_with_the_old_address() {
    let h = harness().await;
    let account = h.register("first@example.com", "switch", Role::Student).await;
    let old_token = h
        .notifier
        .last_token(NotificationKind::Verification, "first@example.com");

    h.state
        .account_service
        .update_settings(
            account.id,
            SettingsUpdate {
                username: None,
                email: Some("second@example.com".to_string()),
            },
        )
        .await
        .unwrap();

    let result = h.state.account_service.verify_email(&old_token).await;
    assert!(matches!(result, Err(AccountError::Token(_))));

    let account = h.verify("second@example.com").await;
    assert_eq!(account.email, "second@example.com");
}

#[tokio::test]
async fn settings_reject_taken_email() {
    let h = harness().await;
    h.register("taken@example.com", "first", Role::Student).await;
    let other = h.register("free@example.com", "second", Role::Student).await;

    let result = h
        .state
        .account_service
        .update_settings(
            other.id,
            SettingsUpdate {
                username: None,
                email: Some("taken@example.com".to_string()),
            },
        )
        .await;
    assert!(matches!(result, Err(AccountError::DuplicateEmail)));
}

#[tokio::test]
async fn password_reset_flow() {
    let h = harness().await;
    let account = h.register_verified("p@example.com", "resetter", Role::Student).await;

    h.state
        .account_service
        .request_password_reset("unknown@example.com")
        .await
        .unwrap();
    assert!(h.notifier.of_kind(NotificationKind::PasswordReset).is_empty());

    h.state
        .account_service
        .request_password_reset("P@example.com")
        .await
        .unwrap();
    let token = h
        .notifier
        .last_token(NotificationKind::PasswordReset, "p@example.com");

    // Tokens never redeem across purposes.
    let cross = h.state.account_service.verify_email(&token).await;
    assert!(matches!(cross, Err(AccountError::Token(_))));

    // A rejected password leaves the link usable.
    let weak = h
        .state
        .account_service
        .confirm_password_reset(&token, "123456789")
        .await;
    assert!(matches!(weak, Err(AccountError::Validation(_))));

    h.state
        .account_service
        .confirm_password_reset(&token, "a brand new secret")
        .await
        .unwrap();

    let old = h.state.account_service.login("p@example.com", PASSWORD).await;
    assert!(matches!(old, Err(AccountError::InvalidCredentials)));
    let logged_in = h
        .state
        .account_service
        .login("p@example.com", "a brand new secret")
        .await
        .unwrap();
    assert_eq!(logged_in.id, account.id);
    assert!(logged_in.last_login_at.is_some());

    let replay = h
        .state
        .account_service
        .confirm_password_reset(&token, "yet another secret")
        .await;
    assert!(matches!(
        replay,
        Err(AccountError::Token(TokenError::AlreadyUsed))
    ));
}

#[tokio::test]
async fn change_password_checks_current_password() {
    let h = harness().await;
    let account = h.register_verified("c@example.com", "changer", Role::Judge).await;

    let wrong = h
        .state
        .account_service
        .change_password(account.id, "not my password", "another good one")
        .await;
    assert!(matches!(wrong, Err(AccountError::Validation(_))));

    h.state
        .account_service
        .change_password(account.id, PASSWORD, "another good one")
        .await
        .unwrap();
    assert!(
        h.state
            .account_service
            .login("c@example.com", "another good one")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn profile_completion_follows_role_fields() {
    let h = harness().await;
    let judge = h.register_verified("pj@example.com", "pj", Role::Judge).await;

    let student_field = h
        .state
        .account_service
        .update_profile(
            judge.id,
            ProfileUpdate {
                grade_level: Some("10".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(student_field, Err(AccountError::Validation(_))));

    let view = h
        .state
        .account_service
        .update_profile(
            judge.id,
            ProfileUpdate {
                first_name: Some("Grace".to_string()),
                last_name: Some("Hopper".to_string()),
                bio: Some("Film editor".to_string()),
                phone_number: Some("555-0100".to_string()),
                expertise_area: Some("Editing".to_string()),
                years_experience: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(view.full_name, "Grace Hopper");
    assert_eq!(view.display_name, "Grace Hopper");
    assert!(view.visible_fields.contains(&"expertise_area"));
    assert!(!view.visible_fields.contains(&"grade_level"));
    assert!(view.completion > 0 && view.completion < 100);
}

#[tokio::test]
async fn deactivation_deletes_everything() {
    let h = harness().await;
    let account = h.register_verified("bye@example.com", "leaver", Role::Student).await;
    h.state
        .account_service
        .request_password_reset("bye@example.com")
        .await
        .unwrap();

    let unconfirmed = h
        .state
        .account_service
        .deactivate(
            account.id,
            DeactivationRequest {
                confirm: false,
                password: PASSWORD.to_string(),
                reason: DeactivationReason::NotUsing,
                feedback: String::new(),
            },
        )
        .await;
    assert!(matches!(unconfirmed, Err(AccountError::Validation(_))));

    let wrong_password = h
        .state
        .account_service
        .deactivate(
            account.id,
            DeactivationRequest {
                confirm: true,
                password: "guess guess".to_string(),
                reason: DeactivationReason::NotUsing,
                feedback: String::new(),
            },
        )
        .await;
    assert!(matches!(wrong_password, Err(AccountError::InvalidCredentials)));

    let receipt = h
        .state
        .account_service
        .deactivate(
            account.id,
            DeactivationRequest {
                confirm: true,
                password: PASSWORD.to_string(),
                reason: DeactivationReason::NotUsing,
                feedback: "Thanks".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.email, "bye@example.com");
    assert_eq!(receipt.reason, DeactivationReason::NotUsing);
    assert!(receipt.notification_sent);

    let conn = &h.state.store.conn;
    assert!(h.state.store.get_account(account.id).await.unwrap().is_none());
    assert_eq!(
        profiles::Entity::find()
            .filter(profiles::Column::AccountId.eq(account.id.value()))
            .count(conn)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        verification_tokens::Entity::find()
            .filter(verification_tokens::Column::AccountId.eq(account.id.value()))
            .count(conn)
            .await
            .unwrap(),
        0
    );

    let login = h.state.account_service.login("bye@example.com", PASSWORD).await;
    assert!(matches!(login, Err(AccountError::InvalidCredentials)));

    // The address is free again.
    h.register("bye@example.com", "leaver", Role::Student).await;
}

#[tokio::test]
async fn reactivation_request_is_reviewed_once() {
    let h = harness().await;
    let admin = h.admin().await;
    let student = h.register_verified("s@example.com", "student", Role::Student).await;

    let request = h
        .state
        .account_service
        .request_reactivation("Gone@Example.com", "  Please restore my account  ")
        .await
        .unwrap();
    assert_eq!(request.email, "gone@example.com");
    assert_eq!(request.message, "Please restore my account");
    assert_eq!(request.status, ReactivationStatus::Pending);

    let alerts = h.notifier.of_kind(NotificationKind::AdminReactivationAlert);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].recipients, vec![ADMIN_EMAIL.to_string()]);

    let not_admin = h
        .state
        .admin_service
        .review_reactivation(
            request.id,
            student.id,
            ReviewRequest {
                decision: ReviewDecision::Approve,
                notes: String::new(),
            },
        )
        .await;
    assert!(matches!(not_admin, Err(AdminError::NotAnAdmin)));

    let report = h
        .state
        .admin_service
        .review_reactivation(
            request.id,
            admin.id,
            ReviewRequest {
                decision: ReviewDecision::Approve,
                notes: "Welcome back".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.request.status, ReactivationStatus::Approved);
    assert_eq!(report.request.reviewed_by, Some(admin.id.value()));
    assert!(report.request.reviewed_at.is_some());
    assert!(report.notified);

    let again = h
        .state
        .admin_service
        .review_reactivation(
            request.id,
            admin.id,
            ReviewRequest {
                decision: ReviewDecision::Deny,
                notes: String::new(),
            },
        )
        .await;
    assert!(matches!(
        again,
        Err(AdminError::AlreadyReviewed {
            status: ReactivationStatus::Approved,
            ..
        })
    ));

    // Approval does not recreate an account.
    assert!(
        h.state
            .store
            .get_account_by_email("gone@example.com")
            .await
            .unwrap()
            .is_none()
    );

    let pending = h
        .state
        .admin_service
        .reactivation_requests(Some(ReactivationStatus::Pending))
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn bulk_approval_survives_failed_notifications() {
    let h = harness().await;
    h.notifier.fail(NotificationKind::JudgeApproval);

    let mut ids = Vec::new();
    for i in 0..3 {
        let judge = h
            .register_verified(&format!("j{i}@example.com"), &format!("judge{i}"), Role::Judge)
            .await;
        ids.push(judge.id);
    }
    let student = h.register_verified("st@example.com", "st", Role::Student).await;
    ids.push(student.id);
    ids.push(AccountId::new(4242));
    ids.push(ids[0]);

    let outcome = h.state.admin_service.approve_judges(&ids).await.unwrap();
    assert_eq!(outcome.updated, 3);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.not_found, vec![AccountId::new(4242)]);
    assert_eq!(outcome.notifications_failed, 3);
    assert!(outcome.failed.is_empty());

    for id in &ids[..3] {
        let account = h.state.account_service.account(*id).await.unwrap();
        assert!(account.approved);
        assert!(account.can_access());
    }
}

#[tokio::test]
async fn deactivated_by_admin_cannot_log_in() {
    let h = harness().await;
    let account = h.register_verified("off@example.com", "off", Role::Student).await;

    let outcome = h
        .state
        .admin_service
        .set_active(&[account.id], false)
        .await
        .unwrap();
    assert_eq!(outcome.updated, 1);

    let login = h.state.account_service.login("off@example.com", PASSWORD).await;
    assert!(matches!(
        login,
        Err(AccountError::AccessDenied {
            route: AccessRoute::Inactive
        })
    ));

    let inactive = h
        .state
        .admin_service
        .list_accounts(AccountFilter {
            active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert!(!inactive[0].can_access);

    let again = h
        .state
        .admin_service
        .set_active(&[account.id], false)
        .await
        .unwrap();
    assert_eq!(again.skipped, 1);
}
