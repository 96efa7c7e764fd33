// Envoi des emails (codes de confirmation).
//
// - SmtpMailer: transport SMTP via lettre (STARTTLS)
// - ConsoleMailer: écrit le message sur stdout, hors logs, quand SMTP_HOST est absent

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::EmailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Console write error: {0}")]
    Console(#[from] io::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(to, subject, "email sent");
        Ok(())
    }
}

/// Pas de SMTP configuré (dev): le message complet est écrit sur `out`.
///
/// Le corps contient le code de confirmation, il ne passe jamais par tracing.
pub struct ConsoleMailer<W = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleMailer {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write + Send> ConsoleMailer<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> Mailer for ConsoleMailer<W> {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        {
            let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            write!(out, "To: {}\nSubject: {}\n\n{}\n-----\n", to, subject, body)?;
            out.flush()?;
        }
        tracing::info!(to, subject, "email written to console");
        Ok(())
    }
}
