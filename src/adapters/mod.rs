//! Adapters binding the reconciler seams to Kubernetes and the ceph CLI

mod ceph_cli;
mod ceph_config_files;
mod cluster_info;
mod kube_store;
mod readiness;
mod secrets;

pub use ceph_cli::*;
pub use ceph_config_files::*;
pub use cluster_info::*;
pub use kube_store::*;
pub use readiness::*;
pub use secrets::*;
