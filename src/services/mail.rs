//! Mail delivery behind a trait so notifications can run against SMTP in
//! production and a recording double in tests.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::SmtpConfig;
use crate::errors::ServiceError;

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends an HTML email, returning a provider message id.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, ServiceError>;
}

/// SMTP mail sender backed by lettre's async transport.
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ServiceError::MailError(format!("SMTP relay setup failed: {}", e)))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| ServiceError::MailError(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, ServiceError> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|e| ServiceError::MailError(format!("Invalid recipient '{}': {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| ServiceError::MailError(format!("Failed to build message: {}", e)))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| ServiceError::MailError(format!("SMTP send failed: {}", e)))?;

        let message_id = response
            .message()
            .collect::<Vec<&str>>()
            .join(" ");
        debug!(to = %to, subject = %subject, "Email sent via SMTP");
        Ok(message_id)
    }
}

/// Logging no-op sender used when SMTP is disabled.
pub struct NoopMailSender;

#[async_trait]
impl MailSender for NoopMailSender {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<String, ServiceError> {
        info!(to = %to, subject = %subject, "SMTP disabled; dropping email");
        Ok(format!("noop-{}", uuid::Uuid::new_v4()))
    }
}

/// Builds the configured sender: SMTP when enabled, logging no-op otherwise.
pub fn build_sender(config: &SmtpConfig) -> Result<Arc<dyn MailSender>, ServiceError> {
    if config.enabled {
        Ok(Arc::new(SmtpMailSender::new(config)?))
    } else {
        Ok(Arc::new(NoopMailSender))
    }
}

/// Captured email for assertions.
#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Recording sender for tests; captures every message in memory.
#[derive(Default)]
pub struct RecordingMailSender {
    sent: std::sync::Mutex<Vec<SentMail>>,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, ServiceError> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
            });
        }
        Ok(format!("recorded-{}", uuid::Uuid::new_v4()))
    }
}
