//! In-memory collaborators for tests.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::future;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s::metav1;
use k8s::CiliumNodeExt as _;
use k8s::ObjectMetaExt as _;
use tokio::sync::watch;

use super::*;

fn unavailable() -> Error {
    Error::Kube(kube::Error::ReadEvents(io::Error::other("connection refused")))
}

fn synced_flag(synced: bool) -> watch::Sender<bool> {
    watch::Sender::new(synced)
}

async fn wait_for(flag: &watch::Sender<bool>, kind: &str) -> Result<(), Error> {
    flag.subscribe()
        .wait_for(|synced| *synced)
        .await
        .map(|_| ())
        .map_err(|_| Error::CacheNotReady(kind.to_string()))
}

#[derive(Debug)]
pub(crate) struct FakeNodes {
    alive: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    not_found: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    synced: watch::Sender<bool>,
}

impl FakeNodes {
    pub(crate) fn synced() -> Self {
        Self::new(true)
    }

    pub(crate) fn unsynced() -> Self {
        Self::new(false)
    }

    fn new(synced: bool) -> Self {
        Self {
            alive: Mutex::default(),
            failing: Mutex::default(),
            not_found: Mutex::default(),
            stalled: Mutex::default(),
            synced: synced_flag(synced),
        }
    }

    pub(crate) fn alive(self, names: &[&str]) -> Self {
        for name in names {
            self.set_alive(name, true);
        }
        self
    }

    pub(crate) fn set_alive(&self, name: &str, alive: bool) {
        let mut nodes = self.alive.lock().unwrap();
        if alive {
            nodes.insert(name.to_string());
        } else {
            nodes.remove(name);
        }
    }

    pub(crate) fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn report_not_found(&self, name: &str) {
        self.not_found.lock().unwrap().insert(name.to_string());
    }

    /// Lookups of `name` never complete.
    pub(crate) fn stall(&self, name: &str) {
        self.stalled.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn mark_synced(&self) {
        self.synced.send_replace(true);
    }
}

#[async_trait]
impl NodeOracle for FakeNodes {
    async fn node_exists(&self, name: &str) -> Result<bool, Error> {
        let stalled = self.stalled.lock().unwrap().contains(name);
        if stalled {
            future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(name) {
            Err(unavailable())
        } else if self.not_found.lock().unwrap().contains(name) {
            Err(Error::not_found("Node", name))
        } else {
            Ok(self.alive.lock().unwrap().contains(name))
        }
    }

    async fn wait_synced(&self) -> Result<(), Error> {
        wait_for(&self.synced, "Node").await
    }
}

/// Record store and deletion client sharing one set of CiliumNodes.
#[derive(Debug)]
pub(crate) struct FakeCiliumNodes {
    records: Mutex<BTreeMap<String, Arc<ciliumv2::CiliumNode>>>,
    ghosts: Mutex<BTreeSet<String>>,
    failing_lookups: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    stalled_deletes: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    synced: watch::Sender<bool>,
}

impl FakeCiliumNodes {
    pub(crate) fn new(records: impl IntoIterator<Item = ciliumv2::CiliumNode>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.node_name().to_string(), Arc::new(record)))
            .collect();
        Self {
            records: Mutex::new(records),
            ghosts: Mutex::default(),
            failing_lookups: Mutex::default(),
            failing_deletes: Mutex::default(),
            stalled_deletes: Mutex::default(),
            deleted: Mutex::default(),
            synced: synced_flag(true),
        }
    }

    pub(crate) fn named(names: &[&str]) -> Self {
        let records = names
            .iter()
            .map(|name| ciliumv2::CiliumNode::with_metadata(metav1::ObjectMeta::new(name)));
        Self::new(records)
    }

    pub(crate) fn fail_lookup(&self, name: &str) {
        self.failing_lookups.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn fail_delete(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn heal_delete(&self, name: &str) {
        self.failing_deletes.lock().unwrap().remove(name);
    }

    /// Deletes of `name` never complete.
    pub(crate) fn stall_delete(&self, name: &str) {
        self.stalled_deletes.lock().unwrap().insert(name.to_string());
    }

    /// Removes a record while leaving its key listed, as a lagging cache would.
    pub(crate) fn remove(&self, name: &str) {
        self.records.lock().unwrap().remove(name);
        self.ghosts.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn unsync(&self) {
        self.synced.send_replace(false);
    }

    pub(crate) fn remaining(&self) -> Vec<String> {
        self.records.lock().unwrap().keys().cloned().collect()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for FakeCiliumNodes {
    fn keys(&self) -> Vec<String> {
        let mut keys = self.remaining();
        keys.extend(self.ghosts.lock().unwrap().iter().cloned());
        keys.sort();
        keys
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Arc<ciliumv2::CiliumNode>>, Error> {
        if self.failing_lookups.lock().unwrap().contains(key) {
            Err(unavailable())
        } else {
            Ok(self.records.lock().unwrap().get(key).cloned())
        }
    }

    async fn wait_synced(&self) -> Result<(), Error> {
        wait_for(&self.synced, "CiliumNode").await
    }
}

#[async_trait]
impl RecordDeleter for FakeCiliumNodes {
    async fn delete(&self, name: &str) -> Result<(), Error> {
        let stalled = self.stalled_deletes.lock().unwrap().contains(name);
        if stalled {
            future::pending::<()>().await;
        }
        if self.failing_deletes.lock().unwrap().contains(name) {
            return Err(unavailable());
        }
        match self.records.lock().unwrap().remove(name) {
            Some(_) => {
                self.deleted.lock().unwrap().push(name.to_string());
                Ok(())
            }
            None => Err(Error::not_found("CiliumNode", name)),
        }
    }
}
