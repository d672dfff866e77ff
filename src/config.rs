//! Relay configuration module
//!
//! Handles loading configuration from environment variables. Configuration
//! is read once at startup and never mutated afterwards.

use crate::error::RelayError;
use std::env;
use std::fmt;
use std::time::Duration;

/// Identity parameters for the storage and streaming APIs
#[derive(Clone)]
pub struct Credentials {
    pub tenancy_ocid: String,
    pub user_ocid: String,
    pub fingerprint: String,
    pub private_key_file: String,
    /// Optional token sent as the `Authorization` header
    pub auth_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenancy_ocid", &self.tenancy_ocid)
            .field("user_ocid", &self.user_ocid)
            .field("fingerprint", &self.fingerprint)
            .field("private_key_file", &self.private_key_file)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: Credentials,

    /// Region identifier, e.g. `us-ashburn-1`
    pub region: String,

    /// Stream that receives the message pairs
    pub stream_id: String,

    /// Streaming service endpoint (messages API base URL)
    pub stream_endpoint: String,

    /// Object storage endpoint, derived from the region unless overridden
    pub object_storage_endpoint: String,

    /// Invocation/health HTTP port
    pub http_port: u16,

    /// `unix:/path/to/socket` when the host runtime supplies a socket
    pub fn_listener: Option<String>,

    /// Timeout applied to every outbound request
    pub http_timeout: Duration,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| RelayError::Config(format!("{key} must be set")))
        };

        let credentials = Credentials {
            tenancy_ocid: required("OCI_TENANCY_OCID")?,
            user_ocid: required("OCI_USER_OCID")?,
            fingerprint: required("OCI_FINGERPRINT")?,
            private_key_file: required("OCI_PRIVATE_KEY_FILE")?,
            auth_token: lookup("OCI_AUTH_TOKEN").filter(|v| !v.is_empty()),
        };

        let region = required("OCI_REGION")?;
        let stream_id = required("OCI_STREAM_OCID")?;
        let stream_endpoint = required("OCI_STREAM_ENDPOINT")?;

        let object_storage_endpoint = lookup("OCI_OBJECT_STORAGE_ENDPOINT")
            .unwrap_or_else(|| format!("https://objectstorage.{region}.oraclecloud.com"));

        let http_port = lookup("HTTP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| RelayError::Config(format!("HTTP_PORT must be a valid port number: {e}")))?;

        let fn_listener = lookup("FN_LISTENER");
        if let Some(ref listener) = fn_listener {
            if !listener.starts_with("unix:") {
                return Err(RelayError::Config(format!(
                    "FN_LISTENER must start with 'unix:', got '{listener}'"
                )));
            }
        }

        let timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| RelayError::Config(format!("HTTP_TIMEOUT_SECS must be a valid number: {e}")))?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            credentials,
            region,
            stream_id,
            stream_endpoint,
            object_storage_endpoint,
            http_port,
            fn_listener,
            http_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    /// Socket path from `FN_LISTENER`, if one was configured
    pub fn unix_socket_path(&self) -> Option<&str> {
        self.fn_listener
            .as_deref()
            .and_then(|l| l.strip_prefix("unix:"))
    }
}
