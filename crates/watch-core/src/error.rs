use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WatchError {
    #[error("No data for {0}")]
    NoData(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Notifier not configured: {0}")]
    NotifierConfigMissing(String),

    #[error("Notifier transport error: {0}")]
    NotifierTransport(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WatchError {
    /// How the failure is surfaced to the user.
    pub fn severity(&self) -> crate::Severity {
        match self {
            WatchError::Lookup(_) => crate::Severity::Error,
            _ => crate::Severity::Warning,
        }
    }
}
