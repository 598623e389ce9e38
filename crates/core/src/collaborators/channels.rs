//! Notification-channel collaborator contract.

use async_trait::async_trait;
use ol_protocol::NotificationMessage;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Channel not configured: {0}")]
    NotConfigured(String),
}

/// A delivery target such as email, chat or a pager.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `message` and return the provider's message id.
    async fn send(&self, message: &NotificationMessage) -> Result<String, ChannelError>;
}

/// Channel that writes notifications to the log. Useful for local runs.
pub struct LogChannel {
    name: String,
}

impl LogChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &NotificationMessage) -> Result<String, ChannelError> {
        let message_id = Uuid::new_v4().to_string();
        info!(
            channel = %self.name,
            message_id = %message_id,
            severity = message.severity.as_str(),
            title = %message.title,
            "notification"
        );
        Ok(message_id)
    }
}
