//! Object Relay
//!
//! Republishes object-created notifications, together with the object's
//! content, as a pair of keyed messages on a durable stream:
//! - Parses the trigger payload for the bucket/object pair
//! - Reads the object from object storage
//! - Publishes event + data messages in one ordered batch
//! - Serves the invocation endpoint, health probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod messages;
pub mod relay;
pub mod server;
pub mod storage;
pub mod stream;
pub mod telemetry;

pub use error::RelayError;
pub use relay::{EventRelay, InvocationResult};
