//! CephFilesystem Custom Resource (read-only view)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CephFilesystem specification
///
/// Only the status is read, so no spec fields are modelled.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephFilesystem",
    plural = "cephfilesystems",
    singular = "cephfilesystem",
    namespaced,
    status = "CephFilesystemStatus"
)]
pub struct CephFilesystemSpec {}

/// CephFilesystem status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephFilesystemStatus {
    /// Current phase (Progressing, Ready, Failure, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl CephFilesystem {
    /// Whether the filesystem reports the `Ready` phase
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            == Some("Ready")
    }
}
