//! Custom Resource Definitions for the CephFS SubVolumeGroup Operator
//!
//! `CephFilesystemSubVolumeGroup` is owned by this operator. `CephFilesystem`
//! and `CephCluster` are only read, so their types carry just the fields the
//! reconciler looks at.

mod ceph_cluster;
mod ceph_filesystem;
mod subvolume_group;

pub use ceph_cluster::*;
pub use ceph_filesystem::*;
pub use subvolume_group::*;

use kube::CustomResourceExt;

/// Generate the CRD YAML manifests owned by this operator
pub fn generate_crds() -> Result<Vec<String>, serde_yaml::Error> {
    Ok(vec![serde_yaml::to_string(
        &CephFilesystemSubVolumeGroup::crd(),
    )?])
}
