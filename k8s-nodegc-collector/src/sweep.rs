use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::*;

/// One garbage collection pass over every `CiliumNode` record.
pub struct Sweep<'a> {
    nodes: &'a dyn NodeOracle,
    records: &'a dyn RecordStore,
    deleter: &'a dyn RecordDeleter,
    policy: &'a GcPolicy,
    token: &'a CancellationToken,
}

impl<'a> Sweep<'a> {
    pub fn new(
        nodes: &'a dyn NodeOracle,
        records: &'a dyn RecordStore,
        deleter: &'a dyn RecordDeleter,
        policy: &'a GcPolicy,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            nodes,
            records,
            deleter,
            policy,
            token,
        }
    }

    /// Runs the pass to completion.
    ///
    /// A failure on one record never stops the pass, every failure is
    /// collected into the returned [`SweepError`]. Cancellation ends the pass
    /// early without recording the abandoned call as a failure.
    pub async fn run(&self) -> Result<(), SweepError> {
        let mut failures = Vec::new();

        for name in self.records.keys() {
            if self.token.is_cancelled() {
                break;
            }

            let node = match self.cancellable(self.records.get_by_key(&name)).await {
                Ok(Some(node)) => node,
                Ok(None) => {
                    tracing::debug!(node = name, "CiliumNode is already gone");
                    continue;
                }
                Err(Error::Cancelled) => break,
                Err(err) => {
                    tracing::error!(node = name, %err, "Unable to fetch CiliumNode from store");
                    failures.push(NodeFailure::lookup(name, err));
                    continue;
                }
            };

            match self.cancellable(self.policy.should_gc(&node, self.nodes)).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(Error::Cancelled) => break,
                Err(err) => {
                    failures.push(NodeFailure::lookup(name, err));
                    continue;
                }
            }

            tracing::info!(node = name, "Perform GC for invalid CiliumNode");
            match self.cancellable(self.deleter.delete(&name)).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    tracing::debug!(node = name, "Abandoned CiliumNode deletion on shutdown");
                    break;
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    tracing::warn!(node = name, %err, "Failed to delete invalid CiliumNode");
                    failures.push(NodeFailure::delete(name, err));
                    continue;
                }
            }

            tracing::info!(node = name, "CiliumNode is garbage collected successfully");
            self.policy.forget(&name).await;
        }

        SweepError::check(failures)
    }

    async fn cancellable<T>(&self, future: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        tokio::select! {
            () = self.token.cancelled() => Err(Error::Cancelled),
            result = future => result,
        }
    }
}

impl std::fmt::Debug for Sweep<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweep")
            .field("policy", &self.policy)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
