use std::fmt;

use k8s::KubeErrorExt as _;

use super::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{0} cache is not synced")]
    CacheNotReady(String),

    #[error("cancelled by shutdown")]
    Cancelled,

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, name: impl ToString) -> Self {
        let name = name.to_string();
        Self::NotFound { kind, name }
    }

    /// Whether the object in question definitely does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube(err) => err.is_not_found(),
            Self::CacheNotReady(_) | Self::Cancelled => false,
        }
    }
}

/// Step of the sweep a [`NodeFailure`] happened in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lookup,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup => f.write_str("lookup"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} of CiliumNode {node:?} failed: {source}")]
pub struct NodeFailure {
    pub node: String,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl NodeFailure {
    pub(crate) fn lookup(node: impl ToString, source: Error) -> Self {
        let node = node.to_string();
        let stage = Stage::Lookup;
        Self {
            node,
            stage,
            source,
        }
    }

    pub(crate) fn delete(node: impl ToString, source: Error) -> Self {
        let node = node.to_string();
        let stage = Stage::Delete;
        Self {
            node,
            stage,
            source,
        }
    }
}

/// Every per-node failure of a single sweep.
#[derive(Debug, thiserror::Error)]
#[error("CiliumNode GC failed for {} node(s): {}", .failures.len(), join(.failures))]
pub struct SweepError {
    failures: Vec<NodeFailure>,
}

impl SweepError {
    /// `Ok(())` when there is nothing to report.
    pub(crate) fn check(failures: Vec<NodeFailure>) -> Result<(), Self> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self { failures })
        }
    }

    pub fn failures(&self) -> &[NodeFailure] {
        &self.failures
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.node.as_str())
    }
}

fn join(failures: &[NodeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
