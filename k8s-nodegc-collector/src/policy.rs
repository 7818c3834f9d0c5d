use std::time::Duration;

use super::*;

/// Decides whether a single `CiliumNode` record should be garbage collected.
#[derive(Debug)]
pub enum GcPolicy {
    /// CiliumNode CRD support is enabled. A record is collected once its node
    /// has been missing for longer than `interval`.
    Confirmed {
        interval: Duration,
        candidates: Candidates,
    },
    /// CiliumNode CRD support is disabled. Every record is collected.
    Unconditional,
}

impl GcPolicy {
    pub fn confirmed(interval: Duration) -> Self {
        let candidates = Candidates::new();
        Self::Confirmed {
            interval,
            candidates,
        }
    }

    pub fn unconditional() -> Self {
        Self::Unconditional
    }

    pub fn candidates(&self) -> Option<&Candidates> {
        match self {
            Self::Confirmed { candidates, .. } => Some(candidates),
            Self::Unconditional => None,
        }
    }

    /// Whether `node` should be deleted on this pass.
    ///
    /// In confirmed mode the first pass that finds the node missing only marks
    /// it; deletion needs a later pass where that mark is older than the interval.
    pub async fn should_gc(
        &self,
        node: &ciliumv2::CiliumNode,
        nodes: &dyn NodeOracle,
    ) -> Result<bool, Error> {
        match self {
            Self::Confirmed {
                interval,
                candidates,
            } => should_gc_orphan(node, nodes, *interval, candidates).await,
            Self::Unconditional => Ok(true),
        }
    }

    /// Drops the mark of a node whose record has been deleted.
    pub(crate) async fn forget(&self, name: &str) {
        if let Some(candidates) = self.candidates() {
            candidates.delete(name).await;
        }
    }
}

async fn should_gc_orphan(
    node: &ciliumv2::CiliumNode,
    nodes: &dyn NodeOracle,
    interval: Duration,
    candidates: &Candidates,
) -> Result<bool, Error> {
    let name = node.node_name();

    // A mark left by an earlier pass survives the node coming back.
    match nodes.node_exists(name).await {
        Ok(true) => {
            tracing::debug!(node = name, "CiliumNode is valid, no garbage collection required");
            return Ok(false);
        }
        Ok(false) => {}
        Err(err) if err.is_not_found() => {}
        Err(err) => {
            tracing::error!(node = name, %err, "Unable to fetch k8s node from store");
            return Err(err);
        }
    }

    if node.is_owned() {
        tracing::debug!(node = name, "CiliumNode has owner references, leaving it to Kubernetes");
        return Ok(false);
    }

    if node.skip_gc() {
        tracing::debug!(node = name, "CiliumNode is annotated to skip garbage collection");
        return Ok(false);
    }

    let Some(marked) = candidates.get(name).await else {
        tracing::info!(node = name, "Add CiliumNode to garbage collector candidates");
        candidates.add(name).await;
        return Ok(false);
    };

    if marked.elapsed() > interval {
        Ok(true)
    } else {
        tracing::debug!(node = name, "CiliumNode is still within its grace period");
        Ok(false)
    }
}
