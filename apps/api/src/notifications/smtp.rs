use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::{MailError, Mailer, OutgoingEmail};
use crate::config::MailConfig;

/// Port on which relays expect TLS from the first byte rather than STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is opened until the first send.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let builder = if !config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        } else if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
                .map_err(|e| MailError::Transport(e.to_string()))?
        };

        let mut builder = builder.port(config.port);
        if let Some(password) = &config.password {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                password.clone(),
            ));
        }

        info!(
            "SMTP mailer configured for {}:{} (tls: {})",
            config.server, config.port, config.use_tls
        );

        Ok(Self {
            transport: builder.build(),
            sender: parse_mailbox(&config.default_sender)?,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, MailError> {
        Message::builder()
            .from(self.sender.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!("Relay accepted message to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config() -> MailConfig {
        MailConfig {
            server: "localhost".to_string(),
            port: 2525,
            use_tls: false,
            username: "hiring@example.com".to_string(),
            password: None,
            default_sender: "Hiring Team <hiring@example.com>".to_string(),
        }
    }

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Hi Bob".to_string(),
            body: "Hello Bob".to_string(),
        }
    }

    #[tokio::test]
    async fn test_builds_plain_text_message() {
        let mailer = SmtpMailer::new(&mail_config()).unwrap();
        let message = mailer.build_message(&email("bob@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Hi Bob"));
        assert!(raw.contains("To: bob@example.com"));
        assert!(raw.contains("hiring@example.com"));
        assert!(raw.contains("Hello Bob"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_address_error() {
        let mailer = SmtpMailer::new(&mail_config()).unwrap();
        let err = mailer.build_message(&email("not-an-address")).unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[tokio::test]
    async fn test_invalid_sender_rejected_at_construction() {
        let config = MailConfig {
            default_sender: "nobody".to_string(),
            ..mail_config()
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Address { .. })
        ));
    }
}
