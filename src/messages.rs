//! Stream message construction
//!
//! Every invocation produces exactly two messages: the trigger payload under
//! [`EVENT_MESSAGE_KEY`] followed by the object content under
//! [`DATA_MESSAGE_KEY`]. Keys and values travel as base64 text.

use crate::error::RelayError;
use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Key of the message carrying the trigger payload
pub const EVENT_MESSAGE_KEY: &str = "event-key-1";

/// Key of the message carrying the object content
pub const DATA_MESSAGE_KEY: &str = "data-key-1";

/// Base64-encoded key/value pair submitted to the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub key: String,
    pub value: String,
}

impl RelayMessage {
    fn encode(key: &str, value: &[u8]) -> Self {
        Self {
            key: BASE64_STANDARD.encode(key.as_bytes()),
            value: BASE64_STANDARD.encode(value),
        }
    }
}

/// Build the event-message / data-message pair, in publish order.
///
/// The payload must be UTF-8 text; object bytes are encoded as-is.
pub fn build_messages(raw_payload: &[u8], content: &[u8]) -> Result<[RelayMessage; 2], RelayError> {
    let payload_text = std::str::from_utf8(raw_payload)
        .map_err(|e| RelayError::Encoding(format!("trigger payload is not UTF-8: {e}")))?;

    Ok([
        RelayMessage::encode(EVENT_MESSAGE_KEY, payload_text.as_bytes()),
        RelayMessage::encode(DATA_MESSAGE_KEY, content),
    ])
}
