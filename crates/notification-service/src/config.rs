use watch_core::WatchError;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

/// Email channel settings. All three of sender, password and receiver must be
/// present for email to be enabled.
#[derive(Clone)]
pub struct EmailConfig {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_tls: SmtpTls,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("receiver", &self.receiver)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_tls", &self.smtp_tls)
            .finish()
    }
}

impl EmailConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sender = get("SENDER_EMAIL");
        let password = get("SENDER_PASSWORD");
        let receiver = get("RECEIVER_EMAIL");

        let (sender, password, receiver) = match (sender, password, receiver) {
            (Some(s), Some(p), Some(r)) => (s, p, r),
            (s, p, r) => {
                let missing: Vec<&str> = [
                    ("SENDER_EMAIL", s.is_none()),
                    ("SENDER_PASSWORD", p.is_none()),
                    ("RECEIVER_EMAIL", r.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name)
                .collect();
                return Err(WatchError::NotifierConfigMissing(format!(
                    "missing {}",
                    missing.join(", ")
                )));
            }
        };

        let smtp_tls = match get("SMTP_TLS").as_deref() {
            Some("tls") => SmtpTls::Tls,
            Some("none") => SmtpTls::None,
            _ => SmtpTls::StartTls,
        };

        Ok(Self {
            sender,
            password,
            receiver,
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: get("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_tls,
        })
    }
}
