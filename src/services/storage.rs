//! Object storage for payment proof artifacts.
//!
//! Production uses an S3-compatible HTTP gateway; tests swap in the
//! in-memory implementation. Upload failure must block proof submission,
//! so errors map to a 502 at the handler boundary.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::errors::ServiceError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads an object and returns its public URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ServiceError>;
}

/// HTTP object storage client (S3-compatible PUT gateway).
pub struct HttpObjectStorage {
    client: Client,
    config: StorageConfig,
}

impl HttpObjectStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn public_url(&self, path: &str) -> String {
        let base = self
            .config
            .public_base_url
            .as_deref()
            .unwrap_or(&self.config.base_url);
        format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            self.config.bucket,
            path
        )
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            path
        );

        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .body(bytes);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Storage upload failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Storage upload returned {}",
                response.status()
            )));
        }

        debug!(path = %path, "Object uploaded");
        Ok(self.public_url(path))
    }
}

/// In-memory storage used by the integration test harness.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        if let Ok(mut guard) = self.objects.lock() {
            guard.insert(path.to_string(), (bytes, content_type.to_string()));
        }
        Ok(format!("memory://payment-proofs/{}", path))
    }
}

/// Storage double that always fails; exercises the upload-blocks-submission path.
pub struct FailingObjectStorage;

#[async_trait]
impl ObjectStorage for FailingObjectStorage {
    async fn upload(
        &self,
        _path: &str,
        _bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "storage unavailable".into(),
        ))
    }
}
