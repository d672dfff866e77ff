//! Object storage integration
//!
//! The relay only needs two capabilities from the storage backend:
//! resolving the tenancy namespace and reading one object.

mod client;

pub use client::ObjectStorageClient;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Failure reported by an [`ObjectStore`]
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend reported the object as absent
    #[error("object not found")]
    NotFound,

    /// Network, permission or protocol failure
    #[error("{reason}")]
    Backend {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StorageError {
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
            source: None,
        }
    }
}

/// Read-only object storage capability
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Resolve the namespace that scopes every bucket of the tenancy
    async fn resolve_namespace(&self) -> Result<String, StorageError>;

    /// Fetch the full content of one object
    async fn get_object(&self, namespace: &str, bucket: &str, object: &str)
        -> Result<Bytes, StorageError>;
}
