#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidjudge::config::Config;
use vidjudge::db::Account;
use vidjudge::domain::Role;
use vidjudge::services::{NotificationContext, NotificationKind, Notifier, RegisterRequest};
use vidjudge::state::SharedState;

pub const PASSWORD: &str = "correct horse battery";
pub const ADMIN_EMAIL: &str = "alerts@example.com";

#[derive(Debug, Clone)]
pub struct Sent {
    pub kind: NotificationKind,
    pub recipients: Vec<String>,
    pub context: NotificationContext,
}

/// Records every notification instead of delivering it. Kinds marked with
/// [`RecordingNotifier::fail`] report a delivery failure.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<NotificationKind>>,
}

impl RecordingNotifier {
    pub fn fail(&self, kind: NotificationKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect()
    }

    /// Token of the most recent link of `kind` sent to `email`.
    pub fn last_token(&self, kind: NotificationKind, email: &str) -> String {
        let sent = self
            .of_kind(kind)
            .into_iter()
            .rev()
            .find(|s| s.recipients.iter().any(|r| r == email))
            .unwrap_or_else(|| panic!("no {kind:?} notification for {email}"));
        let link = sent.context.link.expect("notification without link");
        link.split("token=").nth(1).expect("link without token").to_string()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        recipients: &[String],
        context: &NotificationContext,
    ) -> bool {
        self.sent.lock().unwrap().push(Sent {
            kind,
            recipients: recipients.to_vec(),
            context: context.clone(),
        });
        !self.failing.lock().unwrap().contains(&kind)
    }
}

pub struct Harness {
    pub state: SharedState,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Config,
}

/// Config backed by a fresh SQLite file and upload directory.
pub fn test_config() -> Config {
    let id = uuid::Uuid::new_v4();
    let dir = std::env::temp_dir().join(format!("vidjudge-test-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}?mode=rwc", dir.join("test.db").display());
    config.general.uploads_path = dir.join("uploads").display().to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.server.secure_cookies = false;
    config.accounts.admin_emails = vec![ADMIN_EMAIL.to_string()];
    config.accounts.public_base_url = "http://test.local".to_string();
    config
}

pub async fn harness() -> Harness {
    harness_with(test_config()).await
}

pub async fn harness_with(config: Config) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = SharedState::with_notifier(config.clone(), notifier.clone())
        .await
        .expect("Failed to create state");
    Harness {
        state,
        notifier,
        config,
    }
}

impl Harness {
    pub async fn register(&self, email: &str, username: &str, role: Role) -> Account {
        self.state
            .account_service
            .register(RegisterRequest {
                email: email.to_string(),
                username: username.to_string(),
                password: PASSWORD.to_string(),
                role,
            })
            .await
            .expect("registration failed")
            .account
    }

    pub async fn verify(&self, email: &str) -> Account {
        let token = self.notifier.last_token(NotificationKind::Verification, email);
        self.state
            .account_service
            .verify_email(&token)
            .await
            .expect("verification failed")
            .account()
            .clone()
    }

    pub async fn register_verified(&self, email: &str, username: &str, role: Role) -> Account {
        self.register(email, username, role).await;
        self.verify(email).await
    }

    pub async fn admin(&self) -> Account {
        self.state
            .account_service
            .provision_admin("root@example.com", "root", PASSWORD)
            .await
            .expect("admin provisioning failed")
    }
}
