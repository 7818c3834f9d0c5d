//! Resource definitions for the objects reclaimed by the node garbage collector.

use k8s_openapi as k8s;
use serde::{Deserialize, Serialize};

use k8s::apimachinery::pkg::apis::meta::v1 as metav1;

pub use cilium::v2;

pub mod cilium {
    use super::*;

    pub mod v2;
}

fn default<T: Default>() -> T {
    T::default()
}
