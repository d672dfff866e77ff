//! Object storage REST client
//!
//! `GET /n/` resolves the namespace, `GET /n/{ns}/b/{bucket}/o/{object}`
//! reads an object. Any non-success status other than 404 on the object
//! read is a backend failure.

use super::{ObjectStore, StorageError};
use crate::error::RelayError;
use crate::http::{error_body, join_segments, parse_endpoint};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use tracing::debug;

/// Object storage client bound to one regional endpoint
#[derive(Clone)]
pub struct ObjectStorageClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ObjectStorageClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, RelayError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint("OCI_OBJECT_STORAGE_ENDPOINT", endpoint)?,
        })
    }

    fn namespace_url(&self) -> Url {
        join_segments(&self.endpoint, &["n", ""])
    }

    fn object_url(&self, namespace: &str, bucket: &str, object: &str) -> Url {
        join_segments(&self.endpoint, &["n", namespace, "b", bucket, "o", object])
    }
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Backend {
        reason: format!("request failed: {err}"),
        source: Some(Box::new(err)),
    }
}

#[async_trait]
impl ObjectStore for ObjectStorageClient {
    async fn resolve_namespace(&self) -> Result<String, StorageError> {
        let response = self
            .http
            .get(self.namespace_url())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(StorageError::backend(format!(
                "namespace lookup returned {status}: {body}"
            )));
        }

        let namespace: String = response.json().await.map_err(|e| StorageError::Backend {
            reason: format!("malformed namespace response: {e}"),
            source: Some(Box::new(e)),
        })?;

        debug!(namespace = %namespace, "Resolved object storage namespace");
        Ok(namespace)
    }

    async fn get_object(
        &self,
        namespace: &str,
        bucket: &str,
        object: &str,
    ) -> Result<Bytes, StorageError> {
        let response = self
            .http
            .get(self.object_url(namespace, bucket, object))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound),
            status if status.is_success() => response.bytes().await.map_err(transport),
            status => {
                let body = error_body(response).await;
                Err(StorageError::backend(format!("object read returned {status}: {body}")))
            }
        }
    }
}
