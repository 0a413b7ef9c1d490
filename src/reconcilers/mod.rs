//! Reconcilers for the CephFS SubVolumeGroup CRD
//!
//! This module contains the business logic of the operator and the seams it
//! depends on. Reconcilers are responsible for:
//! - Managing the cleanup finalizer
//! - Creating and deleting subvolume groups through a Ceph client
//! - Updating resource status
//!
//! Every collaborator is a trait so that the Kubernetes and CLI backed
//! implementations in [`crate::adapters`] can be swapped for fakes in tests.

pub mod finalizer;
pub mod status;
pub mod subvolume_group;

pub use subvolume_group::SubVolumeGroupReconciler;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};

use crate::adapters::ClusterInfo;
use crate::crd::{CephFilesystem, CephFilesystemSubVolumeGroup, CephFilesystemSubVolumeGroupStatus};
use crate::error::Result;

/// Delay used while waiting on the CephCluster, the CephFilesystem or the
/// operator's own Ceph configuration
pub const WAIT_FOR_REQUEUE: Duration = Duration::from_secs(10);

/// Delay used for retries that should happen right away
pub const IMMEDIATE_RETRY: Duration = Duration::from_secs(1);

/// Identity of a namespaced object
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a resource, using `default` when it has no namespace
    pub fn from_resource<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_else(|| "default".to_string()),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of a CephCluster readiness check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessCheck {
    /// The cluster accepts ceph commands
    pub ready: bool,
    /// A CephCluster exists (and is not being destroyed with its data)
    pub cluster_exists: bool,
    /// Requeue directive to return when not ready
    pub requeue: Action,
}

/// Reconciles a single object identity
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Run one reconciliation pass
    async fn reconcile(&self, identity: &NamespacedName) -> Result<Action>;
}

/// Desired-state store for subvolume groups and their owners
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a subvolume group, `None` when it does not exist
    async fn get_subvolume_group(
        &self,
        identity: &NamespacedName,
    ) -> Result<Option<CephFilesystemSubVolumeGroup>>;

    /// Fetch a CephFilesystem, `None` when it does not exist
    async fn get_filesystem(&self, identity: &NamespacedName) -> Result<Option<CephFilesystem>>;

    /// Replace the finalizer list of a subvolume group
    async fn set_finalizers(
        &self,
        group: &CephFilesystemSubVolumeGroup,
        finalizers: Vec<String>,
    ) -> Result<()>;

    /// Write the status subresource of a subvolume group
    async fn patch_status(
        &self,
        identity: &NamespacedName,
        status: &CephFilesystemSubVolumeGroupStatus,
    ) -> Result<()>;
}

/// Tells whether the CephCluster owning a namespace can take commands
#[async_trait]
pub trait ClusterReadiness: Send + Sync {
    async fn check(&self, identity: &NamespacedName) -> ReadinessCheck;
}

/// Loads the connection context for the cluster in a namespace
#[async_trait]
pub trait ClusterInfoLoader: Send + Sync {
    /// Fails with [`crate::Error::OperatorNotInitialized`] while the cluster
    /// has not published its connection details yet
    async fn load(&self, namespace: &str) -> Result<ClusterInfo>;
}

/// Storage operations on CephFS subvolume groups
#[async_trait]
pub trait CephClient: Send + Sync {
    async fn create_subvolume_group(
        &self,
        info: &ClusterInfo,
        filesystem: &str,
        group: &str,
    ) -> Result<()>;

    /// Fails with [`crate::Error::DirectoryNotEmpty`] while the group
    /// still contains subvolumes
    async fn delete_subvolume_group(
        &self,
        info: &ClusterInfo,
        filesystem: &str,
        group: &str,
    ) -> Result<()>;
}
