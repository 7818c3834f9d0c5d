//! Garbage collection of `CiliumNode` records whose Kubernetes `Node` is gone.
//!
//! A record is only deleted once its node has been observed missing on two
//! passes at least one GC interval apart. When CiliumNode CRD support is
//! disabled every remaining record is purged once instead.

use k8s_nodegc_ext as k8s;

use k8s::ciliumv2;

pub use candidates::Candidates;
pub use config::ConfigError;
pub use config::GcConfig;
pub use config::GcMode;
pub use error::Error;
pub use error::NodeFailure;
pub use error::Stage;
pub use error::SweepError;
pub use gc::GcStatus;
pub use gc::NodeGc;
pub use gc::GC_TASK_NAME;
pub use policy::GcPolicy;
pub use source::NodeOracle;
pub use source::RecordDeleter;
pub use source::RecordStore;
pub use sweep::Sweep;

mod candidates;
mod cluster;
mod config;
mod error;
mod gc;
mod policy;
mod source;
mod sweep;

#[cfg(test)]
mod fake;
