use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::task::JoinHandle;

use crate::config::SmtpConfig;

/// Outbound transactional email sender.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()>;
}

/// Sends mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = if config.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        } else {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
                .port(config.port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            transport,
            from: config.from_address.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        self.transport.send(email).await?;
        tracing::info!(recipient, subject, "Email sent");
        Ok(())
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        tracing::info!(
            recipient,
            subject,
            body_len = html_body.len(),
            "SMTP_SKIP_SEND is set; email not delivered"
        );
        Ok(())
    }
}

pub fn build_mailer(config: &SmtpConfig) -> Result<Arc<dyn Mailer>> {
    if config.skip_send {
        return Ok(Arc::new(LogMailer));
    }
    Ok(Arc::new(SmtpMailer::new(config)?))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Sends `message` on a background task.
///
/// Delivery is best-effort: a failure is logged and never reaches the caller,
/// so state already committed by the caller stays as it is.
pub fn dispatch(mailer: Arc<dyn Mailer>, message: EmailMessage) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = mailer
            .send(&message.subject, &message.html_body, &message.recipient)
            .await
        {
            tracing::warn!(
                recipient = %message.recipient,
                subject = %message.subject,
                error = ?err,
                "Email delivery failed"
            );
        }
    })
}

/// Escapes text for interpolation into HTML bodies and attribute values.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn password_reset_email(recipient: &str, reset_url: &str, valid_hours: i64) -> EmailMessage {
    let reset_url = escape_html(reset_url);
    let html_body = format!(
        r#"<div>
<p>Thanks for using Scribe.<br>
We received a request to reset the password for your account.</p>
<p><a href="{reset_url}">Reset your password</a></p>
<p>This link is valid for {valid_hours} hours.</p>
<p>If you did not request a password reset, you can safely ignore this email.</p>
</div>"#
    );

    EmailMessage {
        recipient: recipient.to_string(),
        subject: "Reset your Scribe password".to_string(),
        html_body,
    }
}

pub fn password_changed_email(
    recipient: &str,
    name: &str,
    changed_at: DateTime<Utc>,
) -> EmailMessage {
    let name = escape_html(name);
    let html_body = format!(
        r#"<div>
<p>Hi {name},</p>
<p>The password for your Scribe account was changed on {}.</p>
<p>If you did not make this change, contact support immediately.</p>
</div>"#,
        changed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    EmailMessage {
        recipient: recipient.to_string(),
        subject: "Your Scribe password was changed".to_string(),
        html_body,
    }
}
