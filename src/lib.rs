pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use services::TokenCodec;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the server sweeps expired and used tokens.
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match cli.command {
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        Some(Commands::Init) => Ok(()),
        Some(Commands::Serve) => run_server(config, prometheus_handle).await,
        Some(Commands::CreateAdmin {
            email,
            username,
            password,
        }) => cli::cmd_create_admin(&config, &email, &username, &password).await,
        Some(Commands::PendingJudges) => cli::cmd_pending_judges(&config).await,
        Some(Commands::ApproveJudge { ids }) => cli::cmd_approve_judges(&config, &ids).await,
        Some(Commands::Reactivations { status }) => cli::cmd_reactivations(&config, &status).await,
        Some(Commands::ReviewReactivation {
            id,
            decision,
            reviewer,
            notes,
        }) => cli::cmd_review_reactivation(&config, id, &decision, &reviewer, &notes).await,
        Some(Commands::PurgeTokens) => cli::cmd_purge_tokens(&config).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.observability.json_logs;

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()));

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("VidJudge v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let purge_handle = spawn_token_purge(shared.store.clone());

    let api_state = api::create_app_state(shared, prometheus_handle);
    let app = api::router(api_state).await;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    purge_handle.abort();
    info!("Server stopped");

    Ok(())
}

fn spawn_token_purge(store: Store) -> tokio::task::JoinHandle<()> {
    let codec = TokenCodec::new(store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match codec.purge_stale().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged stale tokens"),
                Err(e) => warn!(error = %e, "Token purge failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
