use constcat::concat;

use super::*;

pub const CILIUM_API_GROUP: &str = "cilium.io";
pub const CILIUM_API_VERSION: &str = "v2";
pub const CILIUM_API_GROUP_VERSION: &str = concat!(CILIUM_API_GROUP, "/", CILIUM_API_VERSION);

/// Annotation that exempts a `CiliumNode` from garbage collection when set to `"true"`.
///
pub const SKIP_GC_ANNOTATION: &str = concat!(CILIUM_API_GROUP, "/do-not-gc");

/// `CiliumNode` is the per-node control-plane record kept by the agent
/// running on each node.
///
/// Only the object metadata takes part in garbage collection. The `spec`
/// and `status` fields are not modelled and are dropped on decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CiliumNode {
    pub metadata: metav1::ObjectMeta,
}

impl k8s::Resource for CiliumNode {
    const API_VERSION: &'static str = CILIUM_API_GROUP_VERSION;
    const GROUP: &'static str = CILIUM_API_GROUP;
    const KIND: &'static str = "CiliumNode";
    const VERSION: &'static str = CILIUM_API_VERSION;
    const URL_PATH_SEGMENT: &'static str = "ciliumnodes";
    type Scope = k8s::ClusterResourceScope;
}

impl k8s::ListableResource for CiliumNode {
    const LIST_KIND: &'static str = "CiliumNodeList";
}

impl k8s::Metadata for CiliumNode {
    type Ty = metav1::ObjectMeta;

    fn metadata(&self) -> &<Self as k8s::Metadata>::Ty {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut <Self as k8s::Metadata>::Ty {
        &mut self.metadata
    }
}

pub type CiliumNodeList = k8s::List<CiliumNode>;

impl CiliumNode {
    /// Create new `CiliumNode` for node `name`
    ///
    pub fn new(name: impl ToString) -> Self {
        let metadata = metav1::ObjectMeta {
            name: Some(name.to_string()),
            ..default()
        };
        Self { metadata }
    }

    /// Node name this record belongs to
    ///
    pub fn node_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Whether some other object owns this record.
    ///
    /// Owned records are reclaimed by the Kubernetes garbage collector.
    ///
    pub fn is_owned(&self) -> bool {
        self.metadata
            .owner_references
            .as_ref()
            .is_some_and(|owners| !owners.is_empty())
    }

    /// Whether the user asked to keep this record regardless of its node.
    ///
    pub fn skip_gc(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(SKIP_GC_ANNOTATION))
            .is_some_and(|value| value.to_lowercase() == "true")
    }
}
