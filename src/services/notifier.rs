//! Transactional notifications.
//!
//! The account services only care whether a notification went out. Delivery
//! is behind the [`Notifier`] trait so tests and local setups can swap the
//! mail API for a recording or logging implementation.

use async_trait::async_trait;
use html_escape::encode_text;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clients::mail::{MailClient, OutgoingEmail};
use crate::domain::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Verification,
    Welcome,
    JudgeApproval,
    AdminNewJudgeAlert,
    DeactivationConfirmation,
    AdminReactivationAlert,
    ReactivationApproval,
    PasswordReset,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Welcome => "welcome",
            Self::JudgeApproval => "judge_approval",
            Self::AdminNewJudgeAlert => "admin_new_judge_alert",
            Self::DeactivationConfirmation => "deactivation_confirmation",
            Self::AdminReactivationAlert => "admin_reactivation_alert",
            Self::ReactivationApproval => "reactivation_approval",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Values the templates interpolate. Unused fields stay `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationContext {
    pub site_name: String,
    pub recipient_name: String,
    /// Action link (verification, reset, login).
    pub link: Option<String>,
    pub valid_hours: Option<i64>,
    /// The account an admin alert is about.
    pub subject_email: Option<String>,
    pub subject_username: Option<String>,
    pub role: Option<Role>,
    /// Free text supplied by a user (reactivation message, deactivation reason).
    pub message: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification to all recipients. Returns false on failure;
    /// implementations log their own errors.
    async fn send(
        &self,
        kind: NotificationKind,
        recipients: &[String],
        context: &NotificationContext,
    ) -> bool;
}

/// Sends a notification and records the outcome. Never fails: an empty
/// recipient list or a delivery error both come back as `false`.
pub async fn dispatch(
    notifier: &dyn Notifier,
    kind: NotificationKind,
    recipients: &[String],
    context: &NotificationContext,
) -> bool {
    if recipients.is_empty() {
        debug!(kind = kind.as_str(), "No recipients configured, notification skipped");
        return false;
    }

    let sent = notifier.send(kind, recipients, context).await;
    if sent {
        metrics::counter!("notifications_sent_total", "kind" => kind.as_str()).increment(1);
    } else {
        warn!(kind = kind.as_str(), recipients = ?recipients, "Notification was not delivered");
        metrics::counter!("notifications_failed_total", "kind" => kind.as_str()).increment(1);
    }
    sent
}

/// Sends through the transactional mail API.
pub struct MailNotifier {
    client: MailClient,
}

impl MailNotifier {
    #[must_use]
    pub const fn new(client: MailClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        recipients: &[String],
        context: &NotificationContext,
    ) -> bool {
        let email = render(kind, context);
        match self.client.send(recipients, &email).await {
            Ok(()) => {
                info!(kind = kind.as_str(), recipients = ?recipients, "Notification sent");
                true
            }
            Err(e) => {
                error!(kind = kind.as_str(), recipients = ?recipients, error = %e, "Failed to send notification");
                false
            }
        }
    }
}

/// Writes notifications to the log instead of sending them. Used when no
/// mail API is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        recipients: &[String],
        context: &NotificationContext,
    ) -> bool {
        let email = render(kind, context);
        info!(
            kind = kind.as_str(),
            recipients = ?recipients,
            subject = %email.subject,
            link = context.link.as_deref().unwrap_or(""),
            "Mail delivery disabled, notification logged"
        );
        true
    }
}

/// Renders subject, HTML and plain-text bodies for a notification.
#[must_use]
pub fn render(kind: NotificationKind, ctx: &NotificationContext) -> OutgoingEmail {
    let site = ctx.site_name.as_str();
    let name = encode_text(&ctx.recipient_name);
    let subject_email = ctx.subject_email.as_deref().unwrap_or_default();

    let subject = match kind {
        NotificationKind::Verification => format!("Verify your {site} account"),
        NotificationKind::Welcome => format!("Welcome to {site}!"),
        NotificationKind::JudgeApproval => "Your judge application has been approved!".to_string(),
        NotificationKind::AdminNewJudgeAlert => format!("New judge registration: {subject_email}"),
        NotificationKind::DeactivationConfirmation => format!("Account Deactivated - {site}"),
        NotificationKind::AdminReactivationAlert => {
            format!("Account Reactivation Request: {subject_email}")
        }
        NotificationKind::ReactivationApproval => format!("Account Reactivated - {site}"),
        NotificationKind::PasswordReset => format!("Reset your {site} password"),
    };

    let mut paragraphs: Vec<String> = Vec::new();
    match kind {
        NotificationKind::Verification => {
            paragraphs.push(format!(
                "Thanks for signing up for {}. Please confirm your email address to activate your account.",
                encode_text(site)
            ));
            paragraphs.push(link_paragraph(ctx, "Verify email"));
            if let Some(hours) = ctx.valid_hours {
                paragraphs.push(format!("This link expires in {hours} hours."));
            }
        }
        NotificationKind::Welcome => {
            paragraphs.push(format!(
                "Your email address is verified. Welcome to {}!",
                encode_text(site)
            ));
            if ctx.role == Some(Role::Judge) {
                paragraphs.push(
                    "An administrator will review your judge application shortly. You will get another email once it is approved."
                        .to_string(),
                );
            }
        }
        NotificationKind::JudgeApproval => {
            paragraphs.push(
                "Your judge application has been approved. You can now sign in and start evaluating submissions."
                    .to_string(),
            );
            paragraphs.push(link_paragraph(ctx, "Sign in"));
        }
        NotificationKind::AdminNewJudgeAlert => {
            paragraphs.push(format!(
                "A new judge registered: {} ({}).",
                encode_text(ctx.subject_username.as_deref().unwrap_or_default()),
                encode_text(subject_email)
            ));
            paragraphs.push("The account is waiting for approval.".to_string());
        }
        NotificationKind::DeactivationConfirmation => {
            paragraphs.push(format!(
                "Your {} account has been deactivated and its data removed.",
                encode_text(site)
            ));
            if let Some(reason) = &ctx.message {
                paragraphs.push(format!("Reason: {}", encode_text(reason)));
            }
            paragraphs.push(
                "If this was a mistake you can submit a reactivation request.".to_string(),
            );
        }
        NotificationKind::AdminReactivationAlert => {
            paragraphs.push(format!(
                "{} asked for their account to be reactivated.",
                encode_text(subject_email)
            ));
            if let Some(message) = &ctx.message {
                paragraphs.push(format!("Message: {}", encode_text(message)));
            }
        }
        NotificationKind::ReactivationApproval => {
            paragraphs.push(
                "Your reactivation request has been approved. An administrator will follow up to restore your access."
                    .to_string(),
            );
        }
        NotificationKind::PasswordReset => {
            paragraphs.push(
                "We received a request to reset your password. If it was not you, ignore this email."
                    .to_string(),
            );
            paragraphs.push(link_paragraph(ctx, "Reset password"));
            if let Some(hours) = ctx.valid_hours {
                paragraphs.push(format!("This link expires in {hours} hours."));
            }
        }
    }

    let greeting = if name.is_empty() {
        "Hello,".to_string()
    } else {
        format!("Hello {name},")
    };

    let mut html = format!("<html><body><p>{greeting}</p>");
    for p in &paragraphs {
        html.push_str("<p>");
        html.push_str(p);
        html.push_str("</p>");
    }
    html.push_str(&format!("<p>The {} team</p></body></html>", encode_text(site)));

    let text =
        html2text::from_read(html.as_bytes(), 80).unwrap_or_else(|_| paragraphs.join("\n\n"));

    OutgoingEmail {
        subject,
        html,
        text,
    }
}

fn link_paragraph(ctx: &NotificationContext, label: &str) -> String {
    ctx.link.as_deref().map_or_else(String::new, |link| {
        let href = html_escape::encode_double_quoted_attribute(link);
        format!(r#"<a href="{href}">{label}</a>"#)
    })
}
