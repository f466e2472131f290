//! SMTP mailer with an unconfigured dev mode.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument};

use quill_core::{defaults, Error, Result};

/// Outbound email sender.
///
/// Built from `SMTP_*` environment variables. When `SMTP_HOST` is unset the
/// mailer runs disabled: messages are still composed (so addressing bugs
/// surface in dev) but dropped with a debug log instead of sent.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    /// Create from environment variables.
    ///
    /// Reads `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS` and
    /// `SMTP_FROM`. A missing host disables delivery; a malformed `SMTP_FROM`
    /// is a configuration error.
    pub fn from_env() -> Result<Self> {
        let from = std::env::var("SMTP_FROM")
            .unwrap_or_else(|_| defaults::SMTP_DEFAULT_FROM.to_string());
        let from: Mailbox = from
            .parse()
            .map_err(|e| Error::Config(format!("invalid SMTP_FROM: {}", e)))?;

        let host = match std::env::var("SMTP_HOST") {
            Ok(h) if !h.trim().is_empty() => h,
            _ => {
                info!("SMTP_HOST not set; email delivery disabled");
                return Ok(Self {
                    transport: None,
                    from,
                });
            }
        };

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults::SMTP_PORT);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(|e| Error::Config(format!("SMTP relay setup failed: {}", e)))?
            .port(port)
            .timeout(Some(Duration::from_secs(defaults::SMTP_TIMEOUT_SECS)));

        if let (Ok(user), Ok(pass)) = (std::env::var("SMTP_USER"), std::env::var("SMTP_PASS")) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        info!("Initializing SMTP mailer: host={}, port={}", host, port);

        Ok(Self {
            transport: Some(builder.build()),
            from,
        })
    }

    /// Create a mailer that composes but never sends.
    pub fn disabled() -> Self {
        let from: Mailbox = defaults::SMTP_DEFAULT_FROM
            .parse()
            .expect("default From address is valid");
        Self {
            transport: None,
            from,
        }
    }

    /// True when an SMTP transport is configured.
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a plain-text email.
    ///
    /// The message is always composed so recipient problems surface even in
    /// disabled mode. Transport failures map to `Error::Mail`.
    #[instrument(skip(self, body), fields(subsystem = "notify", component = "mailer", op = "send", to = %to))]
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| Error::Mail(format!("invalid recipient {}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| Error::Mail(format!("failed to build message: {}", e)))?;

        let Some(transport) = &self.transport else {
            debug!(subject = subject, "SMTP disabled, dropping email");
            return Ok(());
        };

        transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(format!("send failed: {}", e)))?;

        debug!(subject = subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_mailer_reports_disabled() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_mailer_drops_silently() {
        let mailer = Mailer::disabled();
        mailer
            .send("reader@example.com", "Hello", "Body text".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_mail_error() {
        let mailer = Mailer::disabled();
        let err = mailer
            .send("not-an-address", "Hello", "Body text".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Mail(_)));
    }

    #[test]
    fn test_default_from_parses() {
        let from: Mailbox = defaults::SMTP_DEFAULT_FROM.parse().unwrap();
        assert_eq!(from.email.to_string(), "no-reply@quillmark.app");
    }
}
