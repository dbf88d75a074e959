//! Reactivation review command handlers

use anyhow::Context;

use crate::api::validation::parse_reactivation_status;
use crate::config::Config;
use crate::domain::{ReviewDecision, Role, normalize_email};
use crate::services::ReviewRequest;
use crate::state::SharedState;

pub async fn cmd_reactivations(config: &Config, status: &str) -> anyhow::Result<()> {
    let status = parse_reactivation_status(Some(status))?;

    let state = SharedState::new(config.clone()).await?;
    let requests = state.admin_service.reactivation_requests(status).await?;

    if requests.is_empty() {
        println!("No reactivation requests.");
        return Ok(());
    }

    println!("Reactivation Requests ({} total)", requests.len());
    println!("{:-<70}", "");

    for request in requests {
        println!("• #{} {} [{:?}]", request.id, request.email, request.status);
        println!("  Requested: {}", request.requested_at);
        if !request.message.is_empty() {
            println!("  Message: {}", request.message);
        }
        if let Some(reviewed_at) = &request.reviewed_at {
            println!("  Reviewed: {}", reviewed_at);
        }
    }

    Ok(())
}

pub async fn cmd_review_reactivation(
    config: &Config,
    id: i32,
    decision: &str,
    reviewer_email: &str,
    notes: &str,
) -> anyhow::Result<()> {
    let decision = match decision {
        "approve" => ReviewDecision::Approve,
        "deny" => ReviewDecision::Deny,
        other => anyhow::bail!("Unknown decision: {other}. Use approve or deny"),
    };

    let state = SharedState::new(config.clone()).await?;

    let reviewer = state
        .store
        .get_account_by_email(&normalize_email(reviewer_email))
        .await?
        .filter(|a| a.role == Role::Admin)
        .with_context(|| format!("No admin account with email {reviewer_email}"))?;

    let report = state
        .admin_service
        .review_reactivation(
            id,
            reviewer.id,
            ReviewRequest {
                decision,
                notes: notes.to_string(),
            },
        )
        .await?;

    println!(
        "✓ Request #{} for {} is now {:?}",
        report.request.id, report.request.email, report.request.status
    );
    if decision == ReviewDecision::Approve && !report.notified {
        println!("  The requester could not be notified.");
    }

    Ok(())
}
