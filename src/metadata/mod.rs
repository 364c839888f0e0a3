//! Content-addressed proposal metadata.
//!
//! Proposals reference a JSON document `{title, body, transfer?}` by a
//! content address. This module turns the address into a fetchable URL on
//! the configured gateway, fetches it through a [`MetadataStore`], and
//! decodes it.

pub mod mock;

use crate::error::{ZdaoError, ZdaoResult};
use crate::types::ProposalMetadata;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Result type for metadata store operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Metadata store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata not found at {0}")]
    NotFound(String),

    #[error("Metadata store network error: {0}")]
    Network(String),

    #[error("Metadata upload rejected: {0}")]
    Upload(String),
}

impl From<MetadataError> for ZdaoError {
    fn from(err: MetadataError) -> Self {
        ZdaoError::FailedTx(err.to_string())
    }
}

/// Content-addressed blob store (IPFS pinning service or similar).
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the blob behind a gateway URL.
    async fn fetch(&self, url: &str) -> MetadataResult<Vec<u8>>;

    /// Store a blob, returning its content address (`ipfs://<cid>`).
    async fn upload(&self, bytes: &[u8]) -> MetadataResult<String>;
}

/// Rewrite a content address onto `gateway`.
///
/// `ipfs://` and `ipns://` become `https://{gateway}/{scheme}/{path}`,
/// `http(s)://` URLs pass through, a bare hash is treated as `ipfs`.
pub fn resolve_uri(uri: &str, gateway: &str) -> ZdaoResult<String> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(ZdaoError::invalid("metadata URI is empty"));
    }

    if uri.starts_with("https://") || uri.starts_with("http://") {
        return Ok(uri.to_string());
    }

    let (scheme, path) = match uri.split_once("://") {
        Some((scheme @ ("ipfs" | "ipns"), path)) => (scheme, path),
        Some((scheme, _)) => {
            return Err(ZdaoError::invalid(format!(
                "unsupported metadata URI scheme '{}'",
                scheme
            )))
        }
        None => ("ipfs", uri),
    };

    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(ZdaoError::invalid(format!("metadata URI '{}' has no path", uri)));
    }

    Ok(format!("https://{}/{}/{}", gateway, scheme, path))
}

/// Fetches and decodes proposal metadata.
#[derive(Clone)]
pub struct MetadataResolver {
    store: Arc<dyn MetadataStore>,
    gateway: String,
}

impl MetadataResolver {
    pub fn new(store: Arc<dyn MetadataStore>, gateway: impl Into<String>) -> Self {
        Self {
            store,
            gateway: gateway.into(),
        }
    }

    /// Resolve a content address to a fetchable URL.
    pub fn url_for(&self, metadata_ref: &str) -> ZdaoResult<String> {
        resolve_uri(metadata_ref, &self.gateway)
    }

    /// Fetch and decode the metadata behind `metadata_ref`.
    pub async fn resolve(&self, metadata_ref: &str) -> ZdaoResult<ProposalMetadata> {
        let url = self.url_for(metadata_ref)?;
        debug!(%url, "fetching proposal metadata");
        let bytes = self.store.fetch(&url).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ZdaoError::FailedTx(format!("malformed metadata at {}: {}", url, e))
        })
    }

    /// Encode and upload metadata, returning its content address.
    pub async fn upload(&self, metadata: &ProposalMetadata) -> ZdaoResult<String> {
        let bytes = serde_json::to_vec(metadata)
            .map_err(|e| ZdaoError::invalid(format!("unencodable metadata: {}", e)))?;
        Ok(self.store.upload(&bytes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockMetadataStore;
    use super::*;

    const GW: &str = "ipfs.fleek.co";

    #[test]
    fn test_resolve_ipfs_scheme() {
        assert_eq!(
            resolve_uri("ipfs://QmHash/meta.json", GW).unwrap(),
            "https://ipfs.fleek.co/ipfs/QmHash/meta.json"
        );
    }

    #[test]
    fn test_resolve_ipns_scheme() {
        assert_eq!(
            resolve_uri("ipns://zdao.eth", GW).unwrap(),
            "https://ipfs.fleek.co/ipns/zdao.eth"
        );
    }

    #[test]
    fn test_resolve_http_passthrough() {
        assert_eq!(
            resolve_uri("https://example.org/p.json", GW).unwrap(),
            "https://example.org/p.json"
        );
        assert_eq!(
            resolve_uri("http://example.org/p.json", GW).unwrap(),
            "http://example.org/p.json"
        );
    }

    #[test]
    fn test_resolve_bare_hash_defaults_to_ipfs() {
        assert_eq!(
            resolve_uri("QmBareHash", GW).unwrap(),
            "https://ipfs.fleek.co/ipfs/QmBareHash"
        );
    }

    #[test]
    fn test_resolve_rejects_empty_and_unknown() {
        assert_eq!(
            resolve_uri("  ", GW).unwrap_err().kind(),
            crate::error::ErrorKind::Invalid
        );
        assert!(resolve_uri("ar://tx", GW).is_err());
        assert!(resolve_uri("ipfs://", GW).is_err());
    }

    #[tokio::test]
    async fn test_upload_then_resolve() {
        let store = MockMetadataStore::new();
        let resolver = MetadataResolver::new(Arc::new(store), GW);
        let meta = ProposalMetadata {
            title: "Grant".into(),
            body: "Fund the indexer".into(),
            transfer: None,
        };

        let uri = resolver.upload(&meta).await.unwrap();
        assert!(uri.starts_with("ipfs://"));
        assert_eq!(resolver.resolve(&uri).await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_malformed_json_is_failed_tx() {
        let store = MockMetadataStore::new();
        store.put_raw("QmBroken", b"{not json".to_vec());
        let resolver = MetadataResolver::new(Arc::new(store), GW);

        let err = resolver.resolve("ipfs://QmBroken").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FailedTx);
    }
}
