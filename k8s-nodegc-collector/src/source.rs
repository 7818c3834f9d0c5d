//! Collaborators the collector reads from and deletes through.

use std::sync::Arc;

use async_trait::async_trait;

use super::*;

/// Tells whether a Kubernetes `Node` exists.
#[async_trait]
pub trait NodeOracle: Send + Sync {
    /// `Ok(false)` means the node is definitely absent, any doubt is an `Err`.
    async fn node_exists(&self, name: &str) -> Result<bool, Error>;

    /// Resolves once the backing cache has received its initial list.
    async fn wait_synced(&self) -> Result<(), Error>;
}

/// Source of the `CiliumNode` records to collect.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point-in-time snapshot of every record key.
    fn keys(&self) -> Vec<String>;

    /// Current record for `key`, `None` if it is gone.
    async fn get_by_key(&self, key: &str) -> Result<Option<Arc<ciliumv2::CiliumNode>>, Error>;

    /// Resolves once the backing cache has received its initial list.
    async fn wait_synced(&self) -> Result<(), Error>;
}

/// Deletes `CiliumNode` records.
#[async_trait]
pub trait RecordDeleter: Send + Sync {
    /// A missing record is reported as an error for which
    /// [`Error::is_not_found`] holds.
    async fn delete(&self, name: &str) -> Result<(), Error>;
}
