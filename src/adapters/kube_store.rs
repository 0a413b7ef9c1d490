//! Kubernetes API backed resource store

use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use serde_json::json;

use crate::crd::{CephFilesystem, CephFilesystemSubVolumeGroup, CephFilesystemSubVolumeGroupStatus};
use crate::error::Result;
use crate::reconcilers::{NamespacedName, ResourceStore};

/// Field manager used for patches
pub const FIELD_MANAGER: &str = "ceph-subvolumegroup-operator";

/// Real Kubernetes client implementation of [`ResourceStore`]
pub struct KubeResourceStore {
    client: Client,
}

impl KubeResourceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn groups(&self, namespace: &str) -> Api<CephFilesystemSubVolumeGroup> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get_subvolume_group(
        &self,
        identity: &NamespacedName,
    ) -> Result<Option<CephFilesystemSubVolumeGroup>> {
        Ok(self.groups(&identity.namespace).get_opt(&identity.name).await?)
    }

    async fn get_filesystem(&self, identity: &NamespacedName) -> Result<Option<CephFilesystem>> {
        let api: Api<CephFilesystem> = Api::namespaced(self.client.clone(), &identity.namespace);
        Ok(api.get_opt(&identity.name).await?)
    }

    async fn set_finalizers(
        &self,
        group: &CephFilesystemSubVolumeGroup,
        finalizers: Vec<String>,
    ) -> Result<()> {
        let identity = NamespacedName::from_resource(group);
        // resourceVersion makes the write fail if the object changed meanwhile
        let patch = json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": group.resource_version(),
            }
        });
        self.groups(&identity.namespace)
            .patch(&identity.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_status(
        &self,
        identity: &NamespacedName,
        status: &CephFilesystemSubVolumeGroupStatus,
    ) -> Result<()> {
        let patch = json!({ "status": status });
        self.groups(&identity.namespace)
            .patch_status(&identity.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
