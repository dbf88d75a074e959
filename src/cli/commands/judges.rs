//! Judge approval command handlers

use crate::config::Config;
use crate::domain::AccountId;
use crate::domain::lifecycle::ApprovalOutcome;
use crate::state::SharedState;

pub async fn cmd_pending_judges(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let judges = state.admin_service.pending_judges().await?;

    if judges.is_empty() {
        println!("No judges waiting for approval.");
        return Ok(());
    }

    println!("Pending Judges ({} total)", judges.len());
    println!("{:-<70}", "");

    for judge in judges {
        let verified = if judge.account.verified { "✓" } else { "✗" };
        println!("• {} <{}>", judge.display_name, judge.account.email);
        println!(
            "  ID: {} | Verified: {} | Profile: {}% | Joined: {}",
            judge.account.id, verified, judge.completion, judge.account.created_at
        );
    }

    println!();
    println!("Approve with: vidjudge approve-judge <id>...");

    Ok(())
}

pub async fn cmd_approve_judges(config: &Config, ids: &[i32]) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    if let [id] = ids {
        let report = state.admin_service.approve_judge(AccountId::new(*id)).await?;
        match report.outcome {
            ApprovalOutcome::Approved if report.notified => {
                println!("✓ Judge {} approved and notified", id);
            }
            ApprovalOutcome::Approved => {
                println!("✓ Judge {} approved (notification failed)", id);
            }
            ApprovalOutcome::AlreadyApproved => println!("• Judge {} was already approved", id),
            ApprovalOutcome::NotAJudge => println!("• Account {} is not a judge", id),
        }
        return Ok(());
    }

    let ids: Vec<AccountId> = ids.iter().copied().map(AccountId::new).collect();
    let outcome = state.admin_service.approve_judges(&ids).await?;

    println!("✓ Approved {} of {} judges", outcome.updated, outcome.total());
    if outcome.skipped > 0 {
        println!("  Skipped (already approved or not judges): {}", outcome.skipped);
    }
    if !outcome.not_found.is_empty() {
        let ids: Vec<i32> = outcome.not_found.iter().map(AccountId::value).collect();
        println!("  Not found: {ids:?}");
    }
    if !outcome.failed.is_empty() {
        println!("  Failed: {:?}", outcome.failed.iter().map(AccountId::value).collect::<Vec<_>>());
    }
    if outcome.notifications_failed > 0 {
        println!("  Approval emails that failed: {}", outcome.notifications_failed);
    }

    Ok(())
}
