use std::fmt;
use std::hash::Hash;
use std::pin::pin;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::StreamExt as _;
use kube::runtime::reflector;
use kube::runtime::WatchStreamExt as _;
use kube::ResourceExt as _;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::*;

pub use reflector::store::WriterDropped;

/// Read side of a watch-backed object cache.
///
/// Cloning is cheap, every clone observes the same underlying store.
pub struct Cache<K>
where
    K: kube::Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    kind: String,
    reader: reflector::Store<K>,
}

/// Write side of a watch-backed object cache.
///
/// Drives the watch stream and feeds every event into the paired [`Cache`].
pub struct Reflector<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    kind: String,
    writer: reflector::store::Writer<K>,
    api: api::Api<K>,
    config: watcher::Config,
}

pub(crate) fn new<K>(api: api::Api<K>, config: watcher::Config) -> (Cache<K>, Reflector<K>)
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    let (reader, writer) = reflector::store();
    let cache = Cache::from(reader);
    let reflector = Reflector {
        kind: cache.kind.clone(),
        writer,
        api,
        config,
    };
    (cache, reflector)
}

impl<K> From<reflector::Store<K>> for Cache<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    fn from(reader: reflector::Store<K>) -> Self {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        Self { kind, reader }
    }
}

impl<K> Cache<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    /// Kind of the cached objects, e.g. `Node`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Looks up a cluster scoped object by name.
    pub fn get(&self, name: &str) -> Option<Arc<K>> {
        let key = reflector::ObjectRef::new(name);
        self.reader.get(&key)
    }

    /// Point-in-time snapshot of the names of all cached objects.
    ///
    /// Later watch events do not affect the returned list.
    pub fn names(&self) -> Vec<String> {
        self.reader
            .state()
            .iter()
            .map(|object| object.name_any())
            .collect()
    }

    /// Whether the initial list has been fully received.
    pub fn is_ready(&self) -> bool {
        matches!(self.reader.wait_until_ready().now_or_never(), Some(Ok(())))
    }

    /// Waits until the initial list has been fully received.
    ///
    /// Fails only if the paired [`Reflector`] was dropped before it got there.
    pub async fn wait_until_ready(&self) -> Result<(), WriterDropped> {
        self.reader.wait_until_ready().await
    }
}

impl<K> Clone for Cache<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<K> Reflector<K>
where
    K: kube::Resource + Clone + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    /// Runs the watch until `token` is cancelled.
    ///
    /// Watch errors are retried with the default backoff and never end the loop.
    pub async fn run(self, token: CancellationToken) {
        let Self {
            kind,
            writer,
            api,
            config,
        } = self;

        tracing::debug!(kind, "Starting watch");
        let stream = reflector(writer, watcher(api, config)).default_backoff();
        let mut stream = pin!(stream);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                event = stream.next() => match event {
                    Some(Ok(_)) => {}
                    Some(Err(err)) => tracing::warn!(kind, %err, "Watch failed"),
                    None => break,
                },
            }
        }
        tracing::debug!(kind, "Watch stopped");
    }
}

impl<K> fmt::Debug for Cache<K>
where
    K: kube::Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<K> fmt::Debug for Reflector<K>
where
    K: kube::Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use k8s::ObjectMetaExt as _;
    use k8s::metav1;

    use super::*;

    fn node(name: &str) -> corev1::Node {
        corev1::Node {
            metadata: metav1::ObjectMeta::new(name),
            ..k8s::default()
        }
    }

    fn cache() -> (Cache<corev1::Node>, reflector::store::Writer<corev1::Node>) {
        let (reader, writer) = reflector::store();
        (Cache::from(reader), writer)
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn kind_from_resource() {
        let (nodes, _writer) = cache();

        assert_eq!(nodes.kind(), "Node");
    }

    #[test]
    fn not_ready_until_initial_list_is_done() {
        let (nodes, mut writer) = cache();
        assert!(!nodes.is_ready());

        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitApply(node("worker-1")));
        assert!(!nodes.is_ready());
        assert!(nodes.names().is_empty());
        assert!(nodes.get("worker-1").is_none());

        writer.apply_watcher_event(&watcher::Event::InitDone);
        assert!(nodes.is_ready());
        assert_eq!(nodes.names(), ["worker-1"]);
        assert!(nodes.get("worker-1").is_some());
        assert!(nodes.get("worker-2").is_none());
    }

    #[test]
    fn names_is_a_snapshot() {
        let (nodes, mut writer) = cache();
        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitApply(node("worker-1")));
        writer.apply_watcher_event(&watcher::Event::InitApply(node("worker-2")));
        writer.apply_watcher_event(&watcher::Event::InitDone);

        let names = sorted(nodes.names());
        writer.apply_watcher_event(&watcher::Event::Delete(node("worker-1")));
        writer.apply_watcher_event(&watcher::Event::Apply(node("worker-3")));

        assert_eq!(names, ["worker-1", "worker-2"]);
        assert_eq!(sorted(nodes.names()), ["worker-2", "worker-3"]);
    }

    #[test]
    fn clones_share_the_store() {
        let (nodes, mut writer) = cache();
        let other = nodes.clone();
        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitDone);
        writer.apply_watcher_event(&watcher::Event::Apply(node("worker-1")));

        assert!(other.is_ready());
        assert!(other.get("worker-1").is_some());
    }

    #[tokio::test]
    async fn wait_until_ready_resolves_after_init() {
        let (nodes, mut writer) = cache();
        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitDone);

        nodes.wait_until_ready().await.unwrap();
    }

    #[tokio::test]
    async fn wait_until_ready_fails_without_writer() {
        let (nodes, writer) = cache();
        drop(writer);

        assert!(nodes.wait_until_ready().await.is_err());
        assert!(!nodes.is_ready());
    }
}
