//! In-memory `ObjectStore`.
//!
//! Objects live in a concurrent map keyed by path. URLs carry a short
//! content hash so a re-upload of different bytes under the same path
//! yields a distinct URL, the way hosted object stores version downloads.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::trace;

use domains::{MediaError, ObjectStore, StoredObject};

pub struct MemoryObjectStore {
    objects: DashMap<String, StoredBlob>,
    url_prefix: String,
}

struct StoredBlob {
    content_type: String,
    data: Bytes,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_prefix("memory://media")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            url_prefix: prefix.into(),
        }
    }

    /// Test hook: the stored bytes under `path`, if any.
    pub fn bytes(&self, path: &str) -> Option<Bytes> {
        self.objects.get(path).map(|blob| blob.data.clone())
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.get(path).map(|blob| blob.content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, MediaError> {
        if path.is_empty() {
            return Err(MediaError {
                path: path.to_string(),
                reason: "empty object path".to_string(),
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let digest = hex::encode(hasher.finalize());

        self.objects.insert(
            path.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                data,
            },
        );
        trace!(path, content_type, "object stored");

        Ok(StoredObject {
            url: format!("{}/{}?v={}", self.url_prefix, path, &digest[..16]),
            path: path.to_string(),
        })
    }
}
