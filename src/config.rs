use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix for environment overrides, e.g. `VIDJUDGE_MAIL_API_KEY`.
const ENV_PREFIX: &str = "VIDJUDGE_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,

    pub accounts: AccountsConfig,

    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "vidjudge".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
            secure_cookies: true,
            session_inactivity_minutes: 7 * 24 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory profile images are written to.
    pub uploads_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/vidjudge.db".to_string(),
            log_level: "info".to_string(),
            uploads_path: "uploads".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub verification_token_ttl_hours: i64,

    pub password_reset_token_ttl_hours: i64,

    /// Name used in email subjects and bodies.
    pub site_name: String,

    /// Base URL links in emails point at, without a trailing slash.
    pub public_base_url: String,

    /// Recipients of new-judge and reactivation alerts.
    pub admin_emails: Vec<String>,

    pub profile_image_max_bytes: usize,

    /// Allow the admin role on public signup.
    pub allow_admin_signup: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            verification_token_ttl_hours: 24,
            password_reset_token_ttl_hours: 2,
            site_name: "Video Platform".to_string(),
            public_base_url: "http://localhost:8000".to_string(),
            admin_emails: Vec::new(),
            profile_image_max_bytes: 5 * 1024 * 1024,
            allow_admin_signup: false,
        }
    }
}

/// Transactional mail API settings. When disabled, notifications are
/// written to the log instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,

    pub api_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub sender_email: String,

    pub sender_name: String,

    pub request_timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: String::new(),
            sender_email: "noreply@localhost".to_string(),
            sender_name: "Video Platform".to_string(),
            request_timeout_seconds: 15,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides(|key| std::env::var(key).ok());
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Secrets and deployment-specific values can come from the environment
    /// (or a `.env` file) instead of the config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(v) = var("DATABASE_PATH") {
            self.general.database_path = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Some(v) = var("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
        if let Some(v) = var("PUBLIC_BASE_URL") {
            self.accounts.public_base_url = v;
        }
        if let Some(v) = var("ADMIN_EMAILS") {
            self.accounts.admin_emails = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(v) = var("MAIL_API_KEY") {
            self.mail.api_key = v;
            self.mail.enabled = true;
        }
        if let Some(v) = var("MAIL_API_URL") {
            self.mail.api_url = v;
        }
        if let Some(v) = var("MAIL_SENDER_EMAIL") {
            self.mail.sender_email = v;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vidjudge").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vidjudge").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.accounts.verification_token_ttl_hours <= 0 {
            anyhow::bail!("accounts.verification_token_ttl_hours must be > 0");
        }

        if self.accounts.password_reset_token_ttl_hours <= 0 {
            anyhow::bail!("accounts.password_reset_token_ttl_hours must be > 0");
        }

        if self.accounts.profile_image_max_bytes == 0 {
            anyhow::bail!("accounts.profile_image_max_bytes must be > 0");
        }

        if self.security.min_password_length < 8 {
            anyhow::bail!("security.min_password_length cannot be lower than 8");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections exceeds max_db_connections");
        }

        if self.mail.enabled {
            if self.mail.api_key.is_empty() {
                anyhow::bail!("Mail API key cannot be empty when mail is enabled");
            }
            url::Url::parse(&self.mail.api_url).context("mail.api_url is not a valid URL")?;
        }

        url::Url::parse(&self.accounts.public_base_url)
            .context("accounts.public_base_url is not a valid URL")?;

        Ok(())
    }
}
