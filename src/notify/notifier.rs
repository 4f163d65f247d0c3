use async_trait::async_trait;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to store notification: {0}")]
    Store(#[from] sqlx::Error),

    #[error("User {0} does not exist")]
    UnknownUser(i64),

    #[error("Failed to deliver {channel}: {reason}")]
    Transport { channel: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub phone_no: String,
    pub body: String,
}

/// Outbound transport for user notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotifyError>;
    async fn send_sms(&self, sms: &SmsMessage) -> Result<(), NotifyError>;
}

/// Transport that only writes the outgoing messages to the log. Used when no
/// mail or SMS relay is wired in front of the service.
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        LogNotifier { sender: sender.into() }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotifyError> {
        info!(
            "Email from {} to {} with subject {:?} ({} bytes)",
            self.sender,
            email.to,
            email.subject,
            email.body.len()
        );
        Ok(())
    }

    async fn send_sms(&self, sms: &SmsMessage) -> Result<(), NotifyError> {
        info!("SMS to {} ({} bytes)", sms.phone_no, sms.body.len());
        Ok(())
    }
}
