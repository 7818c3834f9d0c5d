pub use k8s_nodegc::v2 as ciliumv2;
pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

pub use timestamp::TimeExt;

use openapi::Metadata;
use openapi::Resource;

mod timestamp;

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
    fn owned_by(self, owner: metav1::OwnerReference) -> Self;
    fn annotated(self, key: impl ToString, value: impl ToString) -> Self;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }

    fn owned_by(self, owner: metav1::OwnerReference) -> Self {
        let mut owner_references = self.owner_references.unwrap_or_default();
        owner_references.push(owner);
        Self {
            owner_references: Some(owner_references),
            ..self
        }
    }

    fn annotated(self, key: impl ToString, value: impl ToString) -> Self {
        let mut annotations = self.annotations.unwrap_or_default();
        annotations.insert(key.to_string(), value.to_string());
        Self {
            annotations: Some(annotations),
            ..self
        }
    }
}

pub trait CiliumNodeExt {
    fn with_metadata(metadata: metav1::ObjectMeta) -> Self;
}

impl CiliumNodeExt for ciliumv2::CiliumNode {
    fn with_metadata(metadata: metav1::ObjectMeta) -> Self {
        Self { metadata }
    }
}

pub trait KubeErrorExt {
    /// Whether the API server answered `404 Not Found`.
    fn is_not_found(&self) -> bool;
}

impl KubeErrorExt for kube::Error {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(response) if response.code == 404)
    }
}

/// Build an `OwnerReference` pointing at `object`.
///
/// # Examples
///
/// ```
/// use k8s_nodegc_ext::{corev1, metav1, owner_reference, ObjectMetaExt as _};
///
/// let node = corev1::Node {
///     metadata: metav1::ObjectMeta::new("worker-1"),
///     ..Default::default()
/// };
/// let owner = owner_reference(&node);
/// assert_eq!(owner.kind, "Node");
/// assert_eq!(owner.name, "worker-1");
/// ```
pub fn owner_reference<K>(object: &K) -> metav1::OwnerReference
where
    K: Metadata<Ty = metav1::ObjectMeta> + Resource,
{
    let metadata = object.metadata();
    metav1::OwnerReference {
        api_version: K::API_VERSION.to_string(),
        kind: K::KIND.to_string(),
        name: metadata.name.clone().unwrap_or_default(),
        uid: metadata.uid.clone().unwrap_or_default(),
        ..default()
    }
}

pub fn default<T: Default>() -> T {
    T::default()
}
