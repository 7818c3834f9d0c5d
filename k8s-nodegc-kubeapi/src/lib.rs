use std::fmt;

use k8s_nodegc_ext as k8s;
use kube::api;
use kube::runtime::watcher;

use k8s::ciliumv2;
use k8s::corev1;

pub use cache::Cache;
pub use cache::Reflector;
pub use cache::WriterDropped;

mod cache;

pub struct KubeApi {
    delete_params: api::DeleteParams,
    watcher_config: watcher::Config,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi configured with a default Kubernetes client.
    ///
    /// On success, returns an initialized `KubeApi` wrapped in `kube::Result`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = k8s_nodegc_kubeapi::KubeApi::new().await?;
    /// // use `api`...
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> kube::Result<Self> {
        kube::Client::try_default().await.map(Self::with_client)
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    ///
    /// The returned KubeApi is initialized with default `DeleteParams` and watcher `Config`
    /// and uses `client` for all Kubernetes interactions.
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            delete_params: api::DeleteParams::default(),
            watcher_config: watcher::Config::default(),
            client,
        }
    }

    /// Watch-backed cache of all Nodes in the cluster.
    ///
    /// The returned [`Cache`] stays empty until the paired [`Reflector`] is run.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> kube::Result<()> {
    /// let api = k8s_nodegc_kubeapi::KubeApi::new().await?;
    /// let (nodes, reflector) = api.node_cache();
    /// let token = tokio_util::sync::CancellationToken::new();
    /// tokio::spawn(reflector.run(token.clone()));
    /// let _ = nodes.wait_until_ready().await;
    /// println!("discovered {} nodes", nodes.names().len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn node_cache(&self) -> (Cache<corev1::Node>, Reflector<corev1::Node>) {
        cache::new(self.nodes(), self.watcher_config().clone())
    }

    /// Watch-backed cache of all CiliumNodes in the cluster.
    ///
    /// The returned [`Cache`] stays empty until the paired [`Reflector`] is run.
    pub fn cilium_node_cache(
        &self,
    ) -> (Cache<ciliumv2::CiliumNode>, Reflector<ciliumv2::CiliumNode>) {
        cache::new(self.cilium_nodes(), self.watcher_config().clone())
    }

    /// Deletes the CiliumNode named `name`.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the API server accepted the deletion. A missing object surfaces as
    /// `kube::Error::Api` with code 404, see [`k8s::KubeErrorExt::is_not_found`].
    pub async fn delete_cilium_node(&self, name: &str) -> kube::Result<()> {
        let dp = self.delete_params();
        self.cilium_nodes().delete(name, dp).await.map(|_| ())
    }

    /// Returns an Api handle scoped to all Nodes using the configured Kubernetes client.
    fn nodes(&self) -> api::Api<corev1::Node> {
        api::Api::all(self.client.clone())
    }

    /// Returns an Api handle scoped to all CiliumNodes.
    fn cilium_nodes(&self) -> api::Api<ciliumv2::CiliumNode> {
        api::Api::all(self.client.clone())
    }

    /// Accesses the delete parameters used for deletion requests.
    fn delete_params(&self) -> &api::DeleteParams {
        &self.delete_params
    }

    /// Accesses the watcher configuration shared by all caches.
    fn watcher_config(&self) -> &watcher::Config {
        &self.watcher_config
    }
}

impl fmt::Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, showing `delete_params` and `watcher_config` while
    /// redacting the `client`.
    ///
    /// The `client` field is displayed as the literal `"<kube::Client>"` to avoid exposing
    /// internal client details.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeApi")
            .field("delete_params", &self.delete_params)
            .field("watcher_config", &self.watcher_config)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
