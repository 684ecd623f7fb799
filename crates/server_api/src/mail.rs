use async_trait::async_trait;
use thiserror::Error;

/// A fully rendered HTML email, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail transport failure: {0}")]
    Transport(String),
}

/// The outbound mail channel. Built once at startup and shared by every
/// request; swapped for a recording double in tests.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError>;

    /// Checks that the channel can reach its server with the configured
    /// credentials.
    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}
