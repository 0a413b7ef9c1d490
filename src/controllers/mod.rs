//! Kubernetes controllers for the CephFS SubVolumeGroup CRD
//!
//! This module contains the controller that watches for CRD changes and
//! triggers reconciliation.

mod subvolume_group_controller;

pub use subvolume_group_controller::{error_policy, run as run_subvolume_group_controller};

use std::sync::Arc;

use kube::Client;

use crate::adapters::{CephCli, KubeClusterInfoLoader, KubeClusterReadiness, KubeResourceStore};
use crate::config::OperatorConfig;
use crate::metrics::Metrics;
use crate::reconcilers::{Reconciler, SubVolumeGroupReconciler};

/// Shared context for the controller
pub struct Context {
    /// Reconciler invoked for every object identity
    pub reconciler: Arc<dyn Reconciler>,

    /// Operator metrics
    pub metrics: Arc<Metrics>,
}

impl Context {
    /// Create a context around an existing reconciler
    pub fn new(reconciler: Arc<dyn Reconciler>, metrics: Arc<Metrics>) -> Self {
        Self {
            reconciler,
            metrics,
        }
    }

    /// Create a context wired to the Kubernetes API and the ceph CLI
    pub fn from_client(client: Client, config: &OperatorConfig, metrics: Arc<Metrics>) -> Self {
        let reconciler = SubVolumeGroupReconciler::new(
            Arc::new(KubeResourceStore::new(client.clone())),
            Arc::new(KubeClusterReadiness::new(client.clone())),
            Arc::new(KubeClusterInfoLoader::new(client)),
            Arc::new(CephCli::new(&config.ceph_binary, &config.config_dir)),
            metrics.clone(),
        );
        Self::new(Arc::new(reconciler), metrics)
    }
}
