//! CephCluster Custom Resource (read-only view)

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Confirmation value that tells the cluster to wipe its data on deletion
pub const DATA_DIR_CLEANUP_CONFIRMATION: &str = "yes-really-destroy-data";

/// CephCluster specification, limited to what readiness checks need
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephCluster",
    plural = "cephclusters",
    singular = "cephcluster",
    namespaced,
    status = "CephClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CephClusterSpec {
    /// External cluster settings
    #[serde(default)]
    pub external: ExternalSpec,

    /// Cleanup policy applied when the cluster is deleted
    #[serde(default)]
    pub cleanup_policy: CleanupPolicySpec,
}

/// External cluster settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ExternalSpec {
    /// The cluster is managed outside of this Kubernetes cluster
    #[serde(default)]
    pub enable: bool,
}

/// Cleanup policy
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct CleanupPolicySpec {
    /// Must equal `yes-really-destroy-data` to wipe hosts on deletion
    #[serde(default)]
    pub confirmation: String,
}

impl CleanupPolicySpec {
    pub fn has_data_dir_clean_policy(&self) -> bool {
        self.confirmation == DATA_DIR_CLEANUP_CONFIRMATION
    }
}

/// CephCluster status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Health as last reported by ceph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceph: Option<CephHealthStatus>,
}

/// Ceph health summary
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephHealthStatus {
    /// HEALTH_OK, HEALTH_WARN or HEALTH_ERR
    #[serde(default)]
    pub health: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, CephHealthMessage>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct CephHealthMessage {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
}
