//! The messaging capability consumed by the notification job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flock_core::error::FlockResult;

/// Provider acknowledgement of one accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Recipient number as given to `send`.
    pub recipient: String,
    /// Provider message identifier, if the provider returned one.
    pub message_id: Option<String>,
    /// Provider-reported status ("queued", "sent", ...).
    pub status: String,
    pub accepted_at: DateTime<Utc>,
}

/// Sends one text message to one phone number.
///
/// A rejected or failed send is `FlockError::Delivery` for that recipient
/// only; callers keep going with the rest of their batch.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn send(&self, to: &str, body: &str) -> FlockResult<DeliveryReceipt>;
}
