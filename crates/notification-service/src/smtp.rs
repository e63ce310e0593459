use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{EmailConfig, EmailMessage, MailTransport, NotificationError, SmtpTls};

/// SMTP relay transport: STARTTLS upgrade, login with the sender's
/// credentials, then send.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let host = config.smtp_host.as_str();

        let builder = match config.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(config.sender.clone(), config.password.clone()))
            .build();

        Ok(Self { transport })
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotificationError> {
    addr.parse()
        .map_err(|e| NotificationError::Address(format!("{}: {}", addr, e)))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let email = Message::builder()
            .from(parse_mailbox(&message.from)?)
            .to(parse_mailbox(&message.to)?)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
