use std::sync::Arc;

use async_trait::async_trait;
use k8s_nodegc_kubeapi::Cache;
use k8s_nodegc_kubeapi::KubeApi;

use k8s::corev1;

use super::*;

#[async_trait]
impl NodeOracle for Cache<corev1::Node> {
    async fn node_exists(&self, name: &str) -> Result<bool, Error> {
        if self.is_ready() {
            Ok(self.get(name).is_some())
        } else {
            Err(Error::CacheNotReady(self.kind().to_string()))
        }
    }

    async fn wait_synced(&self) -> Result<(), Error> {
        self.wait_until_ready()
            .await
            .map_err(|_| Error::CacheNotReady(self.kind().to_string()))
    }
}

#[async_trait]
impl RecordStore for Cache<ciliumv2::CiliumNode> {
    fn keys(&self) -> Vec<String> {
        self.names()
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Arc<ciliumv2::CiliumNode>>, Error> {
        if self.is_ready() {
            Ok(self.get(key))
        } else {
            Err(Error::CacheNotReady(self.kind().to_string()))
        }
    }

    async fn wait_synced(&self) -> Result<(), Error> {
        self.wait_until_ready()
            .await
            .map_err(|_| Error::CacheNotReady(self.kind().to_string()))
    }
}

#[async_trait]
impl RecordDeleter for KubeApi {
    async fn delete(&self, name: &str) -> Result<(), Error> {
        self.delete_cilium_node(name).await.map_err(Error::from)
    }
}
