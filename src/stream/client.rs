//! Streaming REST client
//!
//! Publishes a batch with `POST /20180418/streams/{streamId}/messages`.

use super::wire::{PutMessagesDetails, PutMessagesResult};
use super::{PublishOutcome, StreamPublisher};
use crate::error::RelayError;
use crate::http::{error_body, join_segments, parse_endpoint};
use crate::messages::RelayMessage;
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Streaming API version path segment
const API_VERSION: &str = "20180418";

/// Streaming client bound to one messages endpoint
#[derive(Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl StreamClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, RelayError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint("OCI_STREAM_ENDPOINT", endpoint)?,
        })
    }

    fn messages_url(&self, stream_id: &str) -> Url {
        join_segments(&self.endpoint, &[API_VERSION, "streams", stream_id, "messages"])
    }
}

#[async_trait]
impl StreamPublisher for StreamClient {
    async fn put_batch(
        &self,
        stream_id: &str,
        entries: &[RelayMessage],
    ) -> Result<Vec<PublishOutcome>, RelayError> {
        let publish_error = |reason: String, source: Option<Box<dyn std::error::Error + Send + Sync>>| {
            RelayError::Publish {
                stream_id: stream_id.to_string(),
                reason,
                source,
            }
        };

        debug!(stream_id, count = entries.len(), "Submitting message batch");

        let response = self
            .http
            .post(self.messages_url(stream_id))
            .json(&PutMessagesDetails { messages: entries })
            .send()
            .await
            .map_err(|e| publish_error(format!("request failed: {e}"), Some(Box::new(e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(publish_error(format!("stream returned {status}: {body}"), None));
        }

        let result: PutMessagesResult = response
            .json()
            .await
            .map_err(|e| publish_error(format!("malformed response: {e}"), Some(Box::new(e))))?;

        debug!(stream_id, failures = result.failures, "Batch accepted");

        result
            .into_outcomes(entries.len())
            .map_err(|reason| publish_error(reason, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let client = StreamClient::new(
            reqwest::Client::new(),
            "https://cell-1.streaming.us-ashburn-1.oci.oraclecloud.com",
        )
        .unwrap();

        assert_eq!(
            client.messages_url("ocid1.stream.oc1.iad.abc").as_str(),
            "https://cell-1.streaming.us-ashburn-1.oci.oraclecloud.com/20180418/streams/ocid1.stream.oc1.iad.abc/messages"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = StreamClient::new(reqwest::Client::new(), "");
        assert!(matches!(result, Err(RelayError::Config(_))));
    }
}
