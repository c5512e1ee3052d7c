use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Delivers one fully built email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: Message) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .context("Failed to create SMTP relay")?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, email: Message) -> anyhow::Result<()> {
        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        Ok(())
    }
}

/// Development transport: writes mail to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn deliver(&self, email: Message) -> anyhow::Result<()> {
        let to: Vec<String> = email.envelope().to().iter().map(|a| a.to_string()).collect();
        tracing::info!(
            to = ?to,
            body = %String::from_utf8_lossy(&email.formatted()),
            "email not sent, no SMTP relay configured"
        );
        Ok(())
    }
}

fn build_email(subject: &str, text: &str, from: &str, to: &str) -> anyhow::Result<Message> {
    if subject.contains(['\r', '\n']) {
        return Err(anyhow!("Header values can't contain newlines"));
    }
    let from_mailbox = from
        .parse::<Mailbox>()
        .context("Invalid sender email address")?;
    let to_mailbox = to
        .trim()
        .parse::<Mailbox>()
        .context("Invalid recipient email address")?;

    Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(subject)
        .header(lettre::message::header::ContentType::TEXT_PLAIN)
        .body(text.to_string())
        .context("Failed to build email message")
}

/// Sends `text` to every recipient individually and returns how many were
/// delivered.
///
/// A recipient whose headers can't be built is logged and skipped. Transport
/// failures are skipped the same way when `fail_silently` is set, otherwise
/// the first one is returned.
pub async fn send_emails(
    transport: &dyn MailTransport,
    subject: &str,
    text: &str,
    from: &str,
    recipients: &[String],
    fail_silently: bool,
) -> anyhow::Result<usize> {
    let mut delivered = 0;
    for recipient in recipients {
        let email = match build_email(subject, text, from, recipient) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(recipient = %recipient, error = %e, "bad email header, skipping recipient");
                continue;
            }
        };

        match transport.deliver(email).await {
            Ok(()) => delivered += 1,
            Err(e) if fail_silently => {
                tracing::warn!(recipient = %recipient, error = %e, "email delivery failed");
            }
            Err(e) => return Err(e.context(format!("delivering to {}", recipient))),
        }
    }
    Ok(delivered)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records delivered mail; refuses any address listed in `reject`.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Message>>,
        pub reject: Vec<String>,
    }

    impl RecordingMailer {
        pub fn recipients(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .flat_map(|m| m.envelope().to().iter().map(|a| a.to_string()))
                .collect()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingMailer {
        async fn deliver(&self, email: Message) -> anyhow::Result<()> {
            let to = email.envelope().to().iter().map(|a| a.to_string());
            if to.clone().any(|addr| self.reject.contains(&addr)) {
                return Err(anyhow!("mailbox unavailable"));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}
