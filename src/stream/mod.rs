//! Stream integration
//!
//! Publishes relay message batches to the streaming service and reports a
//! per-entry outcome for every submitted message.

mod client;
pub mod wire;

pub use client::StreamClient;

use crate::error::RelayError;
use crate::messages::RelayMessage;
use async_trait::async_trait;

/// Result of publishing one message within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Message accepted and assigned a position
    Success { partition: String, offset: i64 },
    /// Message rejected by the stream while the batch call itself succeeded
    Failure { error_code: String, error_message: String },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Batch publish capability
#[async_trait]
pub trait StreamPublisher: Send + Sync {
    /// Submit all entries in one call.
    ///
    /// Outcomes are returned in submission order, one per entry. An `Err`
    /// means the batch call itself failed; per-entry rejections are
    /// reported as [`PublishOutcome::Failure`].
    async fn put_batch(
        &self,
        stream_id: &str,
        entries: &[RelayMessage],
    ) -> Result<Vec<PublishOutcome>, RelayError>;
}
