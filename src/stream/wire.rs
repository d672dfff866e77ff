//! Wire format of the streaming messages API
//!
//! Request:  `{"messages":[{"key":"<b64>","value":"<b64>"}, ...]}`
//! Response: `{"failures":0,"entries":[{"partition":"0","offset":7}, ...]}`

use super::PublishOutcome;
use crate::messages::RelayMessage;
use serde::{Deserialize, Serialize};

/// Body of a put-messages call
#[derive(Debug, Serialize)]
pub struct PutMessagesDetails<'a> {
    pub messages: &'a [RelayMessage],
}

/// Body returned by a put-messages call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutMessagesResult {
    #[serde(default)]
    pub failures: u32,
    pub entries: Vec<PutMessagesResultEntry>,
}

/// One entry per submitted message, in submission order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutMessagesResultEntry {
    pub partition: Option<String>,
    pub offset: Option<i64>,
    pub error: Option<String>,
    pub error_message: Option<String>,
}

impl PutMessagesResultEntry {
    fn into_outcome(self, index: usize) -> Result<PublishOutcome, String> {
        if let Some(error_code) = self.error {
            return Ok(PublishOutcome::Failure {
                error_code,
                error_message: self.error_message.unwrap_or_default(),
            });
        }

        match (self.partition, self.offset) {
            (Some(partition), Some(offset)) => Ok(PublishOutcome::Success { partition, offset }),
            _ => Err(format!(
                "entry {index} carries neither an error nor a partition/offset"
            )),
        }
    }
}

impl PutMessagesResult {
    /// Convert to outcomes, checking one entry came back per submitted message
    pub fn into_outcomes(self, submitted: usize) -> Result<Vec<PublishOutcome>, String> {
        if self.entries.len() != submitted {
            return Err(format!(
                "submitted {submitted} messages but received {} result entries",
                self.entries.len()
            ));
        }

        self.entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| entry.into_outcome(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_outcomes_keep_order() {
        let result: PutMessagesResult = serde_json::from_str(
            r#"{
                "failures": 1,
                "entries": [
                    {"error": "429", "errorMessage": "Throttled"},
                    {"partition": "3", "offset": 1024, "timestamp": "2024-01-01T00:00:00.000Z"}
                ]
            }"#,
        )
        .unwrap();

        let outcomes = result.into_outcomes(2).unwrap();
        assert_eq!(
            outcomes,
            vec![
                PublishOutcome::Failure {
                    error_code: "429".to_string(),
                    error_message: "Throttled".to_string(),
                },
                PublishOutcome::Success {
                    partition: "3".to_string(),
                    offset: 1024,
                },
            ]
        );
    }

    #[test]
    fn test_entry_count_mismatch() {
        let result: PutMessagesResult =
            serde_json::from_str(r#"{"entries":[{"partition":"0","offset":1}]}"#).unwrap();

        let err = result.into_outcomes(2).unwrap_err();
        assert!(err.contains("submitted 2"));
    }

    #[test]
    fn test_empty_entry_is_rejected() {
        let result: PutMessagesResult =
            serde_json::from_str(r#"{"entries":[{"partition":"0","offset":1},{}]}"#).unwrap();

        assert!(result.into_outcomes(2).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let messages = [RelayMessage {
            key: "a2V5".to_string(),
            value: "dmFsdWU=".to_string(),
        }];
        let body = serde_json::to_value(PutMessagesDetails { messages: &messages }).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"messages": [{"key": "a2V5", "value": "dmFsdWU="}]})
        );
    }
}
