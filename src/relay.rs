//! Event relay pipeline
//!
//! parse → fetch_object → build_messages → publish → interpret_results,
//! strictly sequential. The first fatal error ends the invocation; per-entry
//! publish failures are logged and never change the reported result.

use crate::error::RelayError;
use crate::events::{parse_trigger, TriggerEvent};
use crate::messages::{build_messages, RelayMessage};
use crate::storage::{ObjectStore, StorageError};
use crate::stream::{PublishOutcome, StreamPublisher};
use crate::telemetry::{self, stages};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, field, info, info_span, warn, Instrument, Span};

/// Message returned with status 200
pub const SUCCESS_MESSAGE: &str = "Successfully processed object update";

/// Value returned to the host runtime, exactly one per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub status: u16,
    pub message: String,
}

impl InvocationResult {
    pub fn success() -> Self {
        Self {
            status: 200,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(err: &RelayError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Relays object-created notifications onto a stream
///
/// Holds only immutable collaborators; one instance is shared by all
/// concurrent invocations.
pub struct EventRelay {
    store: Arc<dyn ObjectStore>,
    stream: Arc<dyn StreamPublisher>,
    stream_id: String,
}

impl EventRelay {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        stream: Arc<dyn StreamPublisher>,
        stream_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            stream,
            stream_id: stream_id.into(),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Run one invocation and convert the outcome for the host runtime
    pub async fn handle(&self, invocation_id: &str, raw_payload: &[u8]) -> InvocationResult {
        let span = info_span!(
            "invocation",
            invocation_id,
            bucket = field::Empty,
            object = field::Empty,
        );

        async {
            let started = Instant::now();

            let result = match self.run(raw_payload).await {
                Ok(()) => InvocationResult::success(),
                Err(e) => {
                    error!(
                        error = %e,
                        error_type = e.error_type_label(),
                        "Invocation failed"
                    );
                    telemetry::record_error(&e);
                    InvocationResult::failure(&e)
                }
            };

            telemetry::record_invocation(result.status);
            telemetry::record_stage_duration(stages::INVOCATION, started.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    /// Full pipeline; any error is fatal for the invocation
    pub async fn run(&self, raw_payload: &[u8]) -> Result<(), RelayError> {
        let event = self.parse(raw_payload)?;

        let span = Span::current();
        span.record("bucket", event.bucket_name.as_str());
        span.record("object", event.resource_name.as_str());
        info!(
            bucket = %event.bucket_name,
            object = %event.resource_name,
            "Function invoked for bucket upload"
        );

        let content = self
            .fetch_object(&event.bucket_name, &event.resource_name)
            .await?;

        let messages = self.build_messages(raw_payload, &content)?;

        let outcomes = self.publish(&messages).await?;

        Self::interpret_results(&outcomes);
        Ok(())
    }

    /// Extract the bucket/object pair from the trigger payload
    pub fn parse(&self, raw_payload: &[u8]) -> Result<TriggerEvent, RelayError> {
        parse_trigger(raw_payload)
    }

    /// Resolve the namespace, then read the object
    pub async fn fetch_object(&self, bucket: &str, object: &str) -> Result<Bytes, RelayError> {
        let started = Instant::now();

        let to_relay_error = |err: StorageError| match err {
            StorageError::NotFound => RelayError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            },
            StorageError::Backend { reason, source } => RelayError::ObjectStore {
                bucket: bucket.to_string(),
                object: object.to_string(),
                reason,
                source,
            },
        };

        let namespace = self.store.resolve_namespace().await.map_err(&to_relay_error)?;
        let content = self
            .store
            .get_object(&namespace, bucket, object)
            .await
            .map_err(&to_relay_error)?;

        telemetry::record_stage_duration(stages::FETCH, started.elapsed());
        info!(namespace = %namespace, bucket, object, size = content.len(), "Object retrieved");
        Ok(content)
    }

    /// Build the event-message / data-message pair
    pub fn build_messages(
        &self,
        raw_payload: &[u8],
        content: &[u8],
    ) -> Result<[RelayMessage; 2], RelayError> {
        build_messages(raw_payload, content)
    }

    /// Publish both messages in a single batch call
    pub async fn publish(
        &self,
        messages: &[RelayMessage; 2],
    ) -> Result<[PublishOutcome; 2], RelayError> {
        let started = Instant::now();
        info!(stream_id = %self.stream_id, count = messages.len(), "Publishing messages to stream");

        let outcomes = self.stream.put_batch(&self.stream_id, messages).await?;
        telemetry::record_stage_duration(stages::PUBLISH, started.elapsed());

        let count = outcomes.len();
        <[PublishOutcome; 2]>::try_from(outcomes).map_err(|_| RelayError::Publish {
            stream_id: self.stream_id.clone(),
            reason: format!("expected 2 publish outcomes, received {count}"),
            source: None,
        })
    }

    /// Log every per-entry outcome; never fails
    pub fn interpret_results(outcomes: &[PublishOutcome]) {
        for (index, outcome) in outcomes.iter().enumerate() {
            match outcome {
                PublishOutcome::Success { partition, offset } => {
                    info!(index, partition = %partition, offset, "Published message");
                }
                PublishOutcome::Failure {
                    error_code,
                    error_message,
                } => {
                    warn!(index, error_code = %error_code, error_message = %error_message, "Message rejected by stream");
                }
            }
            telemetry::record_publish_entry(outcome.is_success());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PAYLOAD: &[u8] =
        br#"{"data":{"resourceName":"photo.jpg","additionalDetails":{"bucketName":"images"}}}"#;

    enum StoreBehavior {
        Content(&'static [u8]),
        NotFound,
        Backend,
    }

    struct MockStore {
        behavior: StoreBehavior,
        namespace_calls: AtomicUsize,
        get_calls: AtomicUsize,
    }

    impl MockStore {
        fn new(behavior: StoreBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                namespace_calls: AtomicUsize::new(0),
                get_calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.namespace_calls.load(Ordering::SeqCst) + self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn resolve_namespace(&self) -> Result<String, StorageError> {
            self.namespace_calls.fetch_add(1, Ordering::SeqCst);
            Ok("testns".to_string())
        }

        async fn get_object(
            &self,
            namespace: &str,
            _bucket: &str,
            _object: &str,
        ) -> Result<Bytes, StorageError> {
            assert_eq!(namespace, "testns", "namespace must be resolved first");
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                StoreBehavior::Content(bytes) => Ok(Bytes::from_static(bytes)),
                StoreBehavior::NotFound => Err(StorageError::NotFound),
                StoreBehavior::Backend => Err(StorageError::backend("object read returned 500")),
            }
        }
    }

    struct MockStream {
        outcomes: Mutex<Option<Result<Vec<PublishOutcome>, RelayError>>>,
        batches: Mutex<Vec<Vec<RelayMessage>>>,
    }

    impl MockStream {
        fn new(outcomes: Result<Vec<PublishOutcome>, RelayError>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(Some(outcomes)),
                batches: Mutex::new(Vec::new()),
            })
        }

        fn accepting() -> Arc<Self> {
            Self::new(Ok(vec![success(0), success(1)]))
        }

        fn batches(&self) -> Vec<Vec<RelayMessage>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StreamPublisher for MockStream {
        async fn put_batch(
            &self,
            _stream_id: &str,
            entries: &[RelayMessage],
        ) -> Result<Vec<PublishOutcome>, RelayError> {
            self.batches.lock().unwrap().push(entries.to_vec());
            self.outcomes.lock().unwrap().take().expect("put_batch called twice")
        }
    }

    fn success(offset: i64) -> PublishOutcome {
        PublishOutcome::Success {
            partition: "0".to_string(),
            offset,
        }
    }

    fn relay(store: &Arc<MockStore>, stream: &Arc<MockStream>) -> EventRelay {
        EventRelay::new(store.clone(), stream.clone(), "ocid1.stream.oc1..test")
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let jpeg: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        let store = MockStore::new(StoreBehavior::Content(jpeg));
        let stream = MockStream::accepting();

        let result = relay(&store, &stream).handle("call-1", PAYLOAD).await;

        assert_eq!(result, InvocationResult::success());
        assert_eq!(result.message, "Successfully processed object update");

        let batches = stream.batches();
        assert_eq!(batches.len(), 1, "exactly one batch call");
        let batch = &batches[0];
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].key, BASE64_STANDARD.encode("event-key-1"));
        assert_eq!(batch[0].value, BASE64_STANDARD.encode(PAYLOAD));
        assert_eq!(batch[1].key, BASE64_STANDARD.encode("data-key-1"));
        assert_eq!(batch[1].value, BASE64_STANDARD.encode(jpeg));
    }

    #[tokio::test]
    async fn test_payload_error_makes_no_calls() {
        let store = MockStore::new(StoreBehavior::Content(b"x"));
        let stream = MockStream::accepting();

        let payload = br#"{"data":{"resourceName":"photo.jpg"}}"#;
        let result = relay(&store, &stream).handle("call-2", payload).await;

        assert_eq!(result.status, 400);
        assert!(result.message.contains("invalid trigger payload"));
        assert_eq!(store.calls(), 0);
        assert!(stream.batches().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_skips_publish() {
        let store = MockStore::new(StoreBehavior::NotFound);
        let stream = MockStream::accepting();

        let err = relay(&store, &stream).run(PAYLOAD).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::ObjectNotFound { ref bucket, ref object }
                if bucket == "images" && object == "photo.jpg"
        ));
        assert!(stream.batches().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_object_store_error() {
        let store = MockStore::new(StoreBehavior::Backend);
        let stream = MockStream::accepting();

        let result = relay(&store, &stream).handle("call-3", PAYLOAD).await;

        assert_eq!(result.status, 502);
        assert!(result.message.contains("images/photo.jpg"));
        assert!(stream.batches().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_not_fatal() {
        let store = MockStore::new(StoreBehavior::Content(b"hello"));
        let stream = MockStream::new(Ok(vec![
            PublishOutcome::Failure {
                error_code: "500".to_string(),
                error_message: "partition unavailable".to_string(),
            },
            success(42),
        ]));

        let result = relay(&store, &stream).handle("call-4", PAYLOAD).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_batch_failure_is_fatal() {
        let store = MockStore::new(StoreBehavior::Content(b"hello"));
        let stream = MockStream::new(Err(RelayError::Publish {
            stream_id: "ocid1.stream.oc1..test".to_string(),
            reason: "stream returned 404 Not Found".to_string(),
            source: None,
        }));

        let result = relay(&store, &stream).handle("call-5", PAYLOAD).await;
        assert_eq!(result.status, 502);
        assert!(result.message.contains("404"));
    }

    #[tokio::test]
    async fn test_wrong_outcome_count_is_publish_error() {
        let store = MockStore::new(StoreBehavior::Content(b"hello"));
        let stream = MockStream::new(Ok(vec![success(1)]));

        let err = relay(&store, &stream).run(PAYLOAD).await.unwrap_err();
        assert!(matches!(err, RelayError::Publish { .. }));
    }

    #[test]
    fn test_interpret_results_accepts_any_mix() {
        EventRelay::interpret_results(&[]);
        EventRelay::interpret_results(&[
            PublishOutcome::Failure {
                error_code: "429".to_string(),
                error_message: String::new(),
            },
            PublishOutcome::Failure {
                error_code: "500".to_string(),
                error_message: "internal".to_string(),
            },
        ]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_payload_makes_no_calls() {
        let store = MockStore::new(StoreBehavior::Content(b"x"));
        let stream = MockStream::accepting();

        let mut payload = br#"{"note":""#.to_vec();
        payload.extend_from_slice(&[0xFF, 0xFE]);
        payload.extend_from_slice(
            br#"","data":{"resourceName":"a","additionalDetails":{"bucketName":"b"}}}"#,
        );

        let result = relay(&store, &stream).handle("call-7", &payload).await;

        assert_eq!(result.status, 400);
        assert_eq!(store.calls(), 0);
        assert!(stream.batches().is_empty());
    }

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn records(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    #[test]
    fn test_partial_failure_logs_each_outcome() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            EventRelay::interpret_results(&[
                PublishOutcome::Failure {
                    error_code: "500".to_string(),
                    error_message: "partition unavailable".to_string(),
                },
                success(42),
            ]);
        });

        let records = logs.records();
        let warns: Vec<_> = records.iter().filter(|r| r["level"] == "WARN").collect();
        let infos: Vec<_> = records.iter().filter(|r| r["level"] == "INFO").collect();

        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0]["fields"]["error_code"], "500");
        assert_eq!(warns[0]["fields"]["error_message"], "partition unavailable");

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0]["fields"]["partition"], "0");
        assert_eq!(infos[0]["fields"]["offset"], 42);
    }

    #[test]
    fn test_empty_object_is_relayed() {
        let store = MockStore::new(StoreBehavior::Content(b""));
        let stream = MockStream::accepting();
        let relay = relay(&store, &stream);

        let result = tokio_test::block_on(relay.handle("call-6", PAYLOAD));

        assert!(result.is_success());
        assert_eq!(stream.batches()[0][1].value, "");
    }
}
