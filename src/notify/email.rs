use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::report::build_html;
use crate::config::EmailConfig;
use crate::error::NotifyError;

/// SMTP credentials and recipient, read from the environment
#[derive(Clone)]
pub struct EmailSettings {
    pub from: String,
    pub password: String,
    pub to: String,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("from", &self.from)
            .field("password", &"***")
            .field("to", &self.to)
            .finish()
    }
}

impl EmailSettings {
    /// EMAIL_ADDRESS, EMAIL_PASSWORD and TO_EMAIL; None if any is missing
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            from: get("EMAIL_ADDRESS")?,
            password: get("EMAIL_PASSWORD")?,
            to: get("TO_EMAIL")?,
        })
    }
}

/// Delivery channel for the report
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}

/// Sends multipart text + HTML mail over SMTP
pub struct SmtpNotifier {
    settings: EmailSettings,
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings, config: EmailConfig) -> Self {
        Self { settings, config }
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let from: Mailbox = self.settings.from.parse()?;
        let to: Mailbox = self.settings.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                body.to_string(),
                build_html(body),
            ))?;

        Ok(message)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)?
        };

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.settings.from.clone(),
                self.settings.password.clone(),
            ))
            .build())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        let transport = self.transport()?;

        tracing::debug!(
            "Sending report to {} via {}:{}",
            self.settings.to,
            self.config.smtp_host,
            self.config.smtp_port
        );
        transport.send(message).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// Prints the report to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

pub(crate) fn framed(subject: &str, body: &str) -> String {
    let rule = "=".repeat(60);
    format!("\n{rule}\nSubject: {subject}\n\n{body}\n{rule}\n")
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        println!("{}", framed(subject, body));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// SMTP when credentials are present and sending is allowed, console otherwise
pub fn notifier_from_env(config: &EmailConfig, dry_run: bool) -> Box<dyn Notifier> {
    if dry_run {
        tracing::info!("Dry run: report goes to the console");
        return Box::new(ConsoleNotifier);
    }

    match EmailSettings::from_env() {
        Some(settings) => Box::new(SmtpNotifier::new(settings, config.clone())),
        None => {
            tracing::warn!(
                "Missing email env vars (EMAIL_ADDRESS / EMAIL_PASSWORD / TO_EMAIL), printing report instead"
            );
            Box::new(ConsoleNotifier)
        }
    }
}

/// Send the report; on failure log it and dump the body so the run output
/// still carries the content. Returns whether delivery succeeded.
pub async fn deliver(notifier: &dyn Notifier, subject: &str, body: &str) -> bool {
    match notifier.send(subject, body).await {
        Ok(()) => {
            tracing::info!("📧 Report delivered via {}", notifier.name());
            true
        }
        Err(e) => {
            tracing::error!("❌ Email send failed via {}: {}", notifier.name(), e);
            println!("{}", framed(subject, body));
            false
        }
    }
}
