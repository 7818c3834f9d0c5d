use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use k8s::TimeExt as _;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::*;

pub const GC_TASK_NAME: &str = "cilium-node-gc";

/// Outcome of the passes run so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcStatus {
    pub mode: GcMode,
    pub passes: u64,
    pub consecutive_failures: u64,
    pub last_pass: Option<String>,
    pub last_error: Option<String>,
}

impl GcStatus {
    fn new(mode: GcMode) -> Self {
        Self {
            mode,
            passes: 0,
            consecutive_failures: 0,
            last_pass: None,
            last_error: None,
        }
    }
}

/// Garbage collector for `CiliumNode` records.
///
/// Owns at most one running GC task. [`NodeGc::stop`] must be awaited before
/// the collaborators are torn down.
pub struct NodeGc {
    config: GcConfig,
    nodes: Arc<dyn NodeOracle>,
    records: Arc<dyn RecordStore>,
    deleter: Arc<dyn RecordDeleter>,
    token: CancellationToken,
    task: Option<Task>,
    status: Arc<watch::Sender<GcStatus>>,
}

struct Task {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl NodeGc {
    pub fn new(
        config: GcConfig,
        nodes: Arc<dyn NodeOracle>,
        records: Arc<dyn RecordStore>,
        deleter: Arc<dyn RecordDeleter>,
    ) -> Self {
        let status = GcStatus::new(config.mode());
        let (status, _) = watch::channel(status);
        Self {
            config,
            nodes,
            records,
            deleter,
            token: CancellationToken::new(),
            task: None,
            status: Arc::new(status),
        }
    }

    pub fn mode(&self) -> GcMode {
        self.config.mode()
    }

    /// Starts the GC task, replacing one that is already running.
    ///
    /// Returns `false` when the configuration disables garbage collection
    /// or the collector has been stopped.
    pub async fn start(&mut self) -> bool {
        self.unregister().await;

        if self.token.is_cancelled() {
            tracing::warn!(task = GC_TASK_NAME, "Not starting a stopped CiliumNode GC");
            return false;
        }

        let runner = match self.mode() {
            GcMode::Periodic => {
                tracing::info!(
                    interval = ?self.config.nodes_gc_interval,
                    "Starting to garbage collect stale CiliumNode custom resources"
                );
                Runner {
                    policy: GcPolicy::confirmed(self.config.nodes_gc_interval),
                    interval: Some(self.config.nodes_gc_interval),
                    nodes: Arc::clone(&self.nodes),
                    records: Arc::clone(&self.records),
                    deleter: Arc::clone(&self.deleter),
                    status: Arc::clone(&self.status),
                }
            }
            GcMode::OneOff => {
                tracing::info!("Running one-off GC of CiliumNode CRD when disabled");
                Runner {
                    policy: GcPolicy::unconditional(),
                    interval: None,
                    nodes: Arc::clone(&self.nodes),
                    records: Arc::clone(&self.records),
                    deleter: Arc::clone(&self.deleter),
                    status: Arc::clone(&self.status),
                }
            }
            GcMode::Disabled => {
                tracing::info!("CiliumNode garbage collection is disabled");
                return false;
            }
        };

        let token = self.token.child_token();
        let handle = tokio::spawn(runner.run(token.clone()));
        self.task = Some(Task { token, handle });
        true
    }

    /// Stops the GC task and waits for it to finish.
    ///
    /// Once this returns the collector no longer touches its collaborators.
    /// A stopped collector cannot be started again.
    pub async fn stop(&mut self) {
        self.token.cancel();
        self.unregister().await;
    }

    /// Whether a GC task is registered and has not finished yet.
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn status(&self) -> watch::Receiver<GcStatus> {
        self.status.subscribe()
    }

    async fn unregister(&mut self) {
        if let Some(Task { token, handle }) = self.task.take() {
            token.cancel();
            if let Err(err) = handle.await {
                tracing::error!(task = GC_TASK_NAME, %err, "GC task did not finish cleanly");
            }
        }
    }
}

impl fmt::Debug for NodeGc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGc")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

struct Runner {
    policy: GcPolicy,
    interval: Option<Duration>,
    nodes: Arc<dyn NodeOracle>,
    records: Arc<dyn RecordStore>,
    deleter: Arc<dyn RecordDeleter>,
    status: Arc<watch::Sender<GcStatus>>,
}

impl Runner {
    async fn run(self, token: CancellationToken) {
        if !self.wait_for_sync(&token).await {
            return;
        }

        loop {
            let outcome = Sweep::new(
                self.nodes.as_ref(),
                self.records.as_ref(),
                self.deleter.as_ref(),
                &self.policy,
                &token,
            )
            .run()
            .await;
            if token.is_cancelled() {
                break;
            }
            self.report(outcome);

            let Some(interval) = self.interval else {
                break;
            };

            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        tracing::debug!(task = GC_TASK_NAME, "GC task stopped");
    }

    /// Waits for the caches so that a warming cache is not mistaken for
    /// missing nodes. Returns `false` if the task should exit instead.
    async fn wait_for_sync(&self, token: &CancellationToken) -> bool {
        let synced = async {
            self.records.wait_synced().await?;
            if matches!(self.policy, GcPolicy::Confirmed { .. }) {
                self.nodes.wait_synced().await?;
            }
            Ok::<_, Error>(())
        };

        tokio::select! {
            biased;
            () = token.cancelled() => false,
            result = synced => match result {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!(%err, "Caches never synced, not running CiliumNode GC");
                    false
                }
            },
        }
    }

    fn report(&self, outcome: Result<(), SweepError>) {
        let now = OffsetDateTime::now_utc().rfc3339();
        self.status.send_modify(|status| {
            status.passes += 1;
            status.last_pass = Some(now);
            match &outcome {
                Ok(()) => {
                    status.consecutive_failures = 0;
                    status.last_error = None;
                }
                Err(err) => {
                    status.consecutive_failures += 1;
                    status.last_error = Some(err.to_string());
                }
            }
        });

        if let Err(err) = outcome {
            tracing::warn!(task = GC_TASK_NAME, %err, "CiliumNode GC pass failed");
        }
    }
}
