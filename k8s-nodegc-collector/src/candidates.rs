use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// CiliumNodes suspected to be orphaned, with the time each was first marked.
///
/// An entry is only ever removed once its record has been deleted.
#[derive(Debug, Default)]
pub struct Candidates {
    nodes_to_remove: RwLock<HashMap<String, Instant>>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, node: &str) -> Option<Instant> {
        self.nodes_to_remove.read().await.get(node).copied()
    }

    /// Marks `node` now, replacing any earlier mark.
    pub async fn add(&self, node: &str) {
        self.nodes_to_remove
            .write()
            .await
            .insert(node.to_string(), Instant::now());
    }

    pub async fn delete(&self, node: &str) {
        self.nodes_to_remove.write().await.remove(node);
    }

    pub async fn len(&self) -> usize {
        self.nodes_to_remove.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes_to_remove.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn get_missing() {
        let candidates = Candidates::new();

        assert!(candidates.get("worker-1").await.is_none());
        assert!(candidates.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn add_records_current_time() {
        let candidates = Candidates::new();
        let before = Instant::now();

        candidates.add("worker-1").await;

        assert_eq!(candidates.get("worker-1").await, Some(before));
        assert_eq!(candidates.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn add_overwrites() {
        let candidates = Candidates::new();
        candidates.add("worker-1").await;
        tokio::time::advance(Duration::from_secs(60)).await;

        candidates.add("worker-1").await;

        assert_eq!(candidates.get("worker-1").await, Some(Instant::now()));
        assert_eq!(candidates.len().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_only_that_node() {
        let candidates = Candidates::new();
        candidates.add("worker-1").await;
        candidates.add("worker-2").await;

        candidates.delete("worker-1").await;

        assert!(candidates.get("worker-1").await.is_none());
        assert!(candidates.get("worker-2").await.is_some());
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let candidates = Candidates::new();

        candidates.delete("worker-1").await;

        assert!(candidates.is_empty().await);
    }
}
