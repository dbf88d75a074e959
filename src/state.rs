use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clients::mail::MailClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AdminService, LogNotifier, MailNotifier, Notifier, SeaOrmAccountService,
    SeaOrmAdminService,
};

/// Build the HTTP client shared by outbound API clients.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("VidJudge/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Mail delivery when it is enabled and has credentials, the log otherwise.
fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    if !config.mail.enabled {
        info!("Mail delivery disabled, notifications will be logged");
        return Ok(Arc::new(LogNotifier));
    }

    let http_client = build_shared_http_client(config.mail.request_timeout_seconds)?;
    let client = MailClient::with_shared_client(http_client, &config.mail);
    if !client.is_configured() {
        warn!("Mail is enabled but api_key or sender_email is missing, notifications will be logged");
        return Ok(Arc::new(LogNotifier));
    }

    info!(api_url = %config.mail.api_url, "Mail delivery enabled");
    Ok(Arc::new(MailNotifier::new(client)))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub notifier: Arc<dyn Notifier>,

    pub account_service: Arc<dyn AccountService>,

    pub admin_service: Arc<dyn AdminService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let notifier = build_notifier(&config)?;
        Self::with_notifier(config, notifier).await
    }

    /// Builds the state around a given notifier. Tests use this to record
    /// outgoing notifications.
    pub async fn with_notifier(
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            notifier.clone(),
            config.clone(),
        )) as Arc<dyn AccountService>;

        let admin_service = Arc::new(SeaOrmAdminService::new(
            store.clone(),
            notifier.clone(),
            config.clone(),
        )) as Arc<dyn AdminService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            notifier,
            account_service,
            admin_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
