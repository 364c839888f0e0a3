//! Mock metadata store for testing.

use super::{MetadataError, MetadataResult, MetadataStore};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory content-addressed store keyed by the last path segment of the
/// requested URL.
#[derive(Clone, Default)]
pub struct MockMetadataStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a blob under a content id (for test setup).
    pub fn put_raw(&self, cid: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(cid.to_string(), bytes);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn fetch(&self, url: &str) -> MetadataResult<Vec<u8>> {
        let cid = url.rsplit('/').next().unwrap_or(url);
        self.blobs
            .lock()
            .unwrap()
            .get(cid)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(url.to_string()))
    }

    async fn upload(&self, bytes: &[u8]) -> MetadataResult<String> {
        let cid = format!("Qm{}", &hex::encode(Sha256::digest(bytes))[..44]);
        self.put_raw(&cid, bytes.to_vec());
        Ok(format!("ipfs://{}", cid))
    }
}
