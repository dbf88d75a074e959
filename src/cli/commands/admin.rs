//! Admin bootstrap command handler

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: &Config,
    email: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let admin = state
        .account_service
        .provision_admin(email, username, password)
        .await?;

    println!("✓ Admin account created");
    println!("  ID: {} | Email: {} | Username: {}", admin.id, admin.email, admin.username);

    Ok(())
}
