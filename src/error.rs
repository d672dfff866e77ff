//! Domain error types for the object relay
//!
//! Every pipeline stage returns `Result<T, RelayError>`; the variant tells the
//! caller which stage failed without parsing message strings.
//!
//! main.rs is the ONLY module allowed to use anyhow::Result (process boundary).

use thiserror::Error;

/// Relay domain errors
///
/// Every variant carries structured context fields for diagnostics.
///
/// Example log output:
/// ```text
/// RelayError::ObjectNotFound { bucket: "images", object: "photo.jpg" }
/// → "object 'photo.jpg' not found in bucket 'images'"
/// ```
#[derive(Error, Debug)]
pub enum RelayError {
    /// Trigger payload is not JSON or lacks `bucketName` / `resourceName`
    #[error("invalid trigger payload: {0}")]
    Payload(String),

    /// Storage backend reported the object as absent
    #[error("object '{object}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, object: String },

    /// Any other storage backend failure (network, permission, bad status)
    #[error("object storage request failed for '{bucket}/{object}': {reason}")]
    ObjectStore {
        bucket: String,
        object: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The batch publish call itself could not be completed
    #[error("publish to stream '{stream_id}' failed: {reason}")]
    Publish {
        stream_id: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Message encoding failed (programming error, not operational)
    #[error("message encoding failed: {0}")]
    Encoding(String),

    /// Configuration error (environment variable missing or invalid)
    #[error("configuration error: {0}")]
    Config(String),

    /// Metrics recorder could not be installed
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl RelayError {
    /// Returns a static label string suitable for Prometheus metrics.
    ///
    /// Used as the `error_type` label on `relay_errors_total`.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            Self::Payload(_) => "payload",
            Self::ObjectNotFound { .. } => "object_not_found",
            Self::ObjectStore { .. } => "object_store",
            Self::Publish { .. } => "publish",
            Self::Encoding(_) => "encoding",
            Self::Config(_) => "config",
            Self::Telemetry(_) => "telemetry",
        }
    }

    /// Status code reported to the host runtime when this error aborts an
    /// invocation.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Payload(_) => 400,
            Self::ObjectNotFound { .. } => 404,
            Self::ObjectStore { .. } | Self::Publish { .. } => 502,
            Self::Encoding(_) | Self::Config(_) | Self::Telemetry(_) => 500,
        }
    }
}
