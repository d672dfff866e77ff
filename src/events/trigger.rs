//! Object-created trigger payload
//!
//! Only `data.resourceName` and `data.additionalDetails.bucketName` are
//! read; every other field in the notification is ignored.

use crate::error::RelayError;
use serde::Deserialize;

/// Bucket/object pair named by an object-created notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub bucket_name: String,
    pub resource_name: String,
}

#[derive(Deserialize)]
struct Envelope {
    data: EventData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventData {
    resource_name: String,
    additional_details: AdditionalDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalDetails {
    bucket_name: String,
}

/// Parse a raw trigger payload
///
/// Fails with [`RelayError::Payload`] when the payload is not UTF-8 JSON,
/// or when either required field is absent or not a string.
pub fn parse_trigger(raw: &[u8]) -> Result<TriggerEvent, RelayError> {
    // from_slice skips over ignored strings without validating them
    let text = std::str::from_utf8(raw)
        .map_err(|e| RelayError::Payload(format!("payload is not UTF-8: {e}")))?;

    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| RelayError::Payload(e.to_string()))?;

    Ok(TriggerEvent {
        bucket_name: envelope.data.additional_details.bucket_name,
        resource_name: envelope.data.resource_name,
    })
}
