mod config;
mod smtp;
mod templates;

pub use config::{EmailConfig, SmtpTls};
pub use smtp::SmtpMailer;
pub use templates::{format_sample_line, format_status_line, EmailTemplate};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use watch_core::{Condition, DisplaySurface, NotificationEvent, StyleHint, WatchError};

/// A rendered email ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers email through an outbound relay.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<NotificationError> for WatchError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::Config(msg) => WatchError::NotifierConfigMissing(msg),
            other => WatchError::NotifierTransport(other.to_string()),
        }
    }
}

/// What happened on the email channel for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailOutcome {
    Sent,
    /// Email is not configured for this session.
    Disabled,
    Failed(String),
    /// The event was not a threshold crossing; nothing was written or sent.
    Skipped,
}

/// Result of dispatching one event. The visual line is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub condition: Condition,
    pub email: EmailOutcome,
}

enum EmailChannel {
    Enabled {
        transport: Arc<dyn MailTransport>,
        sender: String,
        receiver: String,
    },
    Disabled(String),
}

/// Routes threshold crossings to the display surface and, when configured, email.
pub struct NotificationDispatcher {
    surface: Arc<dyn DisplaySurface>,
    email: EmailChannel,
    config_warned: AtomicBool,
}

impl NotificationDispatcher {
    /// Visual-only dispatcher.
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            surface,
            email: EmailChannel::Disabled("email credentials not configured".to_string()),
            config_warned: AtomicBool::new(false),
        }
    }

    /// Build from the session's email configuration, falling back to
    /// visual-only when the configuration is missing or the relay is unusable.
    pub fn from_config(surface: Arc<dyn DisplaySurface>, config: Result<EmailConfig, WatchError>) -> Self {
        let dispatcher = Self::new(surface);
        let config = match config {
            Ok(config) => config,
            Err(e) => return dispatcher.with_email_disabled(e.to_string()),
        };

        match SmtpMailer::new(&config) {
            Ok(mailer) => {
                tracing::info!(
                    "Email notifications enabled (SMTP {}:{} -> {})",
                    config.smtp_host,
                    config.smtp_port,
                    config.receiver
                );
                dispatcher.with_email(Arc::new(mailer), config.sender, config.receiver)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                dispatcher.with_email_disabled(e.to_string())
            }
        }
    }

    pub fn with_email(
        mut self,
        transport: Arc<dyn MailTransport>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        self.email = EmailChannel::Enabled {
            transport,
            sender: sender.into(),
            receiver: receiver.into(),
        };
        self
    }

    pub fn with_email_disabled(mut self, reason: impl Into<String>) -> Self {
        self.email = EmailChannel::Disabled(reason.into());
        self
    }

    pub fn email_enabled(&self) -> bool {
        matches!(self.email, EmailChannel::Enabled { .. })
    }

    /// Deliver one crossing. Transport failures are reported on the surface
    /// and returned in the outcome, never raised.
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchOutcome {
        if !event.condition.is_crossing() {
            tracing::debug!("Ignoring non-crossing event for {}", event.symbol);
            return DispatchOutcome {
                condition: event.condition,
                email: EmailOutcome::Skipped,
            };
        }

        self.surface
            .write_line(&format_status_line(event), event.condition.style());

        let email = match &self.email {
            EmailChannel::Enabled {
                transport,
                sender,
                receiver,
            } => {
                let message = EmailMessage {
                    from: sender.clone(),
                    to: receiver.clone(),
                    subject: EmailTemplate::subject(event),
                    body: EmailTemplate::render(event),
                };
                match transport.send(&message).await {
                    Ok(()) => {
                        tracing::debug!("Sent {} alert via {}", event.symbol, transport.name());
                        self.surface.write_line(
                            &format!("Email alert sent for {}", event.symbol),
                            StyleHint::Success,
                        );
                        EmailOutcome::Sent
                    }
                    Err(e) => {
                        let err = WatchError::from(e);
                        tracing::warn!("Failed to send {} alert via {}: {}", event.symbol, transport.name(), err);
                        self.surface.write_line(
                            &format!("Email alert for {} failed: {}", event.symbol, err),
                            err.severity().into(),
                        );
                        EmailOutcome::Failed(err.to_string())
                    }
                }
            }
            EmailChannel::Disabled(reason) => {
                if !self.config_warned.swap(true, Ordering::SeqCst) {
                    self.surface.write_line(
                        &format!("Email alerts disabled: {}", reason),
                        StyleHint::Warning,
                    );
                }
                EmailOutcome::Disabled
            }
        };

        DispatchOutcome {
            condition: event.condition,
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use watch_core::WatchEntry;

    #[derive(Default)]
    struct RecordingSurface {
        lines: Mutex<Vec<(String, StyleHint)>>,
    }

    impl DisplaySurface for RecordingSurface {
        fn write_line(&self, text: &str, style: StyleHint) {
            self.lines.lock().unwrap().push((text.to_string(), style));
        }

        fn write_table(&self, _entries: &[WatchEntry]) {}
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for FakeMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Smtp("535 authentication failed".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn event(price: f64, condition: Condition) -> NotificationEvent {
        NotificationEvent {
            symbol: "AAA".to_string(),
            price,
            condition,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_visual_line_marks_upper_crossing() {
        let surface = Arc::new(RecordingSurface::default());
        let dispatcher = NotificationDispatcher::new(surface.clone());

        dispatcher.dispatch(&event(101.0, Condition::AboveUpper(100.0))).await;

        let lines = surface.lines.lock().unwrap();
        let (text, style) = &lines[0];
        assert!(text.contains("100"));
        assert!(text.contains("AAA"));
        assert_eq!(*style, StyleHint::AboveUpper);
        assert_ne!(*style, StyleHint::Plain);
    }

    #[tokio::test]
    async fn test_missing_credentials_warns_once() {
        let surface = Arc::new(RecordingSurface::default());
        let dispatcher = NotificationDispatcher::from_config(
            surface.clone(),
            Err(WatchError::NotifierConfigMissing("SENDER_EMAIL".into())),
        );
        assert!(!dispatcher.email_enabled());

        let first = dispatcher.dispatch(&event(101.0, Condition::AboveUpper(100.0))).await;
        let second = dispatcher.dispatch(&event(30.0, Condition::BelowLower(50.0))).await;

        assert_eq!(first.email, EmailOutcome::Disabled);
        assert_eq!(second.email, EmailOutcome::Disabled);

        let lines = surface.lines.lock().unwrap();
        let warnings: Vec<_> = lines.iter().filter(|(_, s)| *s == StyleHint::Warning).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].0.contains("SENDER_EMAIL"));
        // two visual lines plus the single warning
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_email_sent_with_summary_subject() {
        let surface = Arc::new(RecordingSurface::default());
        let mailer = Arc::new(FakeMailer::default());
        let dispatcher = NotificationDispatcher::new(surface.clone()).with_email(
            mailer.clone(),
            "me@example.com",
            "you@example.com",
        );

        let outcome = dispatcher.dispatch(&event(30.0, Condition::BelowLower(50.0))).await;
        assert_eq!(outcome.email, EmailOutcome::Sent);
        assert_eq!(outcome.condition, Condition::BelowLower(50.0));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "me@example.com");
        assert_eq!(sent[0].to, "you@example.com");
        assert!(sent[0].subject.contains("AAA"));
        assert!(sent[0].subject.contains("below lower 50"));
        assert!(sent[0].subject.contains("30.00"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_absorbed() {
        let surface = Arc::new(RecordingSurface::default());
        let mailer = Arc::new(FakeMailer {
            fail: true,
            ..Default::default()
        });
        let dispatcher =
            NotificationDispatcher::new(surface.clone()).with_email(mailer, "me@example.com", "you@example.com");

        let outcome = dispatcher.dispatch(&event(101.0, Condition::AboveUpper(100.0))).await;

        match outcome.email {
            EmailOutcome::Failed(reason) => {
                assert!(reason.contains("authentication"));
                assert!(reason.starts_with("Notifier transport error"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let lines = surface.lines.lock().unwrap();
        assert_eq!(lines[0].1, StyleHint::AboveUpper);
        assert_eq!(lines[1].1, StyleHint::Warning);
        assert!(lines[1].0.contains("Notifier transport error: SMTP error: 535"));
    }

    #[tokio::test]
    async fn test_normal_event_is_not_dispatched() {
        let surface = Arc::new(RecordingSurface::default());
        let mailer = Arc::new(FakeMailer::default());
        let dispatcher =
            NotificationDispatcher::new(surface.clone()).with_email(mailer.clone(), "me@example.com", "you@example.com");

        let outcome = dispatcher.dispatch(&event(75.0, Condition::Normal)).await;

        assert_eq!(outcome.email, EmailOutcome::Skipped);
        assert!(surface.lines.lock().unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_config_error_maps_to_missing() {
        let err: WatchError = NotificationError::Config("RECEIVER_EMAIL".into()).into();
        assert!(matches!(err, WatchError::NotifierConfigMissing(_)));
        let err: WatchError = NotificationError::Smtp("timeout".into()).into();
        assert!(matches!(err, WatchError::NotifierTransport(_)));
    }
}
