use crate::config::Config;
use crate::db::Store;
use crate::services::TokenCodec;

pub async fn cmd_purge_tokens(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let removed = TokenCodec::new(store).purge_stale().await?;
    println!("✓ Removed {} expired or used tokens", removed);
    Ok(())
}
