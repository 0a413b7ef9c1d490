//! CephFilesystemSubVolumeGroup reconciler
//!
//! Handles the business logic for subvolume groups including:
//! - Finalizer management
//! - CephCluster and CephFilesystem readiness gating
//! - Subvolume group creation and deletion
//! - Status updates

use std::sync::Arc;

use async_trait::async_trait;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, info, info_span, Instrument};

use crate::adapters::ClusterInfo;
use crate::crd::{CephFilesystemSubVolumeGroup, ConditionType};
use crate::error::{Error, Result};
use crate::metrics::Metrics;

use super::finalizer::{add_finalizer_if_not_present, remove_finalizer};
use super::status::update_status;
use super::{
    CephClient, ClusterInfoLoader, ClusterReadiness, NamespacedName, Reconciler, ResourceStore,
    WAIT_FOR_REQUEUE,
};

/// Controller name used in logs
pub const CONTROLLER_NAME: &str = "ceph-fs-subvolumegroup-controller";

/// Reconciles CephFilesystemSubVolumeGroup objects against a Ceph cluster
pub struct SubVolumeGroupReconciler {
    controller: String,
    store: Arc<dyn ResourceStore>,
    readiness: Arc<dyn ClusterReadiness>,
    loader: Arc<dyn ClusterInfoLoader>,
    ceph: Arc<dyn CephClient>,
    metrics: Arc<Metrics>,
}

impl SubVolumeGroupReconciler {
    /// Create a reconciler from its collaborators
    pub fn new(
        store: Arc<dyn ResourceStore>,
        readiness: Arc<dyn ClusterReadiness>,
        loader: Arc<dyn ClusterInfoLoader>,
        ceph: Arc<dyn CephClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            controller: CONTROLLER_NAME.to_string(),
            store,
            readiness,
            loader,
            ceph,
            metrics,
        }
    }

    /// Override the controller name reported in logs
    pub fn with_controller_name(mut self, name: impl Into<String>) -> Self {
        self.controller = name.into();
        self
    }

    async fn reconcile_group(&self, identity: &NamespacedName) -> Result<Action> {
        let Some(group) = self.store.get_subvolume_group(identity).await? else {
            debug!("CephFilesystemSubVolumeGroup resource not found. Ignoring since object must be deleted");
            return Ok(Action::await_change());
        };

        let deleting = group.metadata.deletion_timestamp.is_some();

        // Keep the object around until cleanup has run. Finalizers cannot be
        // added once deletion has started.
        if !deleting {
            add_finalizer_if_not_present(self.store.as_ref(), &group).await?;
        }

        // The CR was just created
        if group.status.is_none() {
            update_status(self.store.as_ref(), identity, ConditionType::Progressing).await;
        }

        // Passes triggered by our own status writes have nothing to do
        if !deleting && group.is_reconciled() {
            debug!(generation = ?group.metadata.generation, "Subvolume group already reconciled for this generation");
            return Ok(Action::await_change());
        }

        let readiness = self.readiness.check(identity).await;
        if !readiness.ready {
            // Without a CephCluster there is nothing left to clean up. If the
            // cluster still exists we wait for it instead.
            if deleting && !readiness.cluster_exists {
                info!("CephCluster is gone, removing finalizer without deleting the subvolume group");
                remove_finalizer(self.store.as_ref(), identity).await?;
                return Ok(Action::await_change());
            }
            debug!(requeue = ?readiness.requeue, "CephCluster not ready, waiting");
            return Ok(readiness.requeue);
        }

        // Connection details are loaded on every pass
        let info = match self.loader.load(&identity.namespace).await {
            Ok(info) => info,
            Err(e) if e.is_operator_not_initialized() => {
                info!(error = %e, "Skipping reconcile since operator is still initializing");
                return Ok(Action::requeue(WAIT_FOR_REQUEUE));
            }
            Err(e) => return Err(e),
        };

        if deleting {
            debug!(name = %identity.name, "Deleting subvolume group");
            self.delete_subvolume_group(&info, &group).await?;
            remove_finalizer(self.store.as_ref(), identity).await?;
            return Ok(Action::await_change());
        }

        let filesystem_name = &group.spec.filesystem_name;
        let filesystem_identity = NamespacedName::new(&identity.namespace, filesystem_name);
        let Some(filesystem) = self.store.get_filesystem(&filesystem_identity).await? else {
            return Err(Error::FilesystemNotFound {
                filesystem: filesystem_name.clone(),
                group: identity.name.clone(),
            });
        };

        if !filesystem.is_ready() {
            // The filesystem exists, it should be ready shortly
            info!(
                filesystem = %filesystem_name,
                "CephFilesystem is not ready yet, cannot create subvolume group"
            );
            return Ok(Action::requeue(WAIT_FOR_REQUEUE));
        }

        if let Err(e) = self.create_subvolume_group(&info, &group).await {
            if e.is_operator_not_initialized() {
                info!(error = %e, "Skipping reconcile since operator is still initializing");
                return Ok(Action::requeue(WAIT_FOR_REQUEUE));
            }
            update_status(self.store.as_ref(), identity, ConditionType::Failure).await;
            return Err(e);
        }

        update_status(self.store.as_ref(), identity, ConditionType::Ready).await;

        debug!("Done reconciling");
        Ok(Action::await_change())
    }

    /// Create the subvolume group in its filesystem
    async fn create_subvolume_group(
        &self,
        info: &ClusterInfo,
        group: &CephFilesystemSubVolumeGroup,
    ) -> Result<()> {
        let name = group.name_any();
        info!(
            name = %name,
            namespace = group.namespace().as_deref().unwrap_or("default"),
            filesystem = %group.spec.filesystem_name,
            "Creating ceph filesystem subvolume group"
        );

        let result = self
            .ceph
            .create_subvolume_group(info, &group.spec.filesystem_name, &name)
            .await;
        self.metrics.record_ceph_command("create", result.is_ok());

        result.map_err(|e| Error::CreateSubVolumeGroup {
            name,
            source: Box::new(e),
        })
    }

    /// Delete the subvolume group from its filesystem
    async fn delete_subvolume_group(
        &self,
        info: &ClusterInfo,
        group: &CephFilesystemSubVolumeGroup,
    ) -> Result<()> {
        let name = group.name_any();
        info!(name = %name, "Deleting ceph filesystem subvolume group");

        let result = self
            .ceph
            .delete_subvolume_group(info, &group.spec.filesystem_name, &name)
            .await;
        self.metrics.record_ceph_command("delete", result.is_ok());

        match result {
            Ok(()) => {
                info!(name = %name, "Deleted ceph filesystem subvolume group");
                self.metrics.record_cleanup();
                Ok(())
            }
            // The group still has subvolumes, e.g. "Error ENOTEMPTY: error in rmdir /volumes/csi"
            Err(e) if e.is_directory_not_empty() => Err(Error::SubVolumeGroupNotEmpty {
                name,
                source: Box::new(e),
            }),
            Err(e) => Err(Error::DeleteSubVolumeGroup {
                name,
                source: Box::new(e),
            }),
        }
    }
}

#[async_trait]
impl Reconciler for SubVolumeGroupReconciler {
    async fn reconcile(&self, identity: &NamespacedName) -> Result<Action> {
        let span = info_span!(
            "reconcile",
            controller = %self.controller,
            name = %identity.name,
            namespace = %identity.namespace
        );
        self.reconcile_group(identity).instrument(span).await
    }
}
