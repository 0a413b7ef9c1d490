//! Cleanup finalizer handling for subvolume groups

use kube::ResourceExt;
use tracing::debug;

use crate::crd::CephFilesystemSubVolumeGroup;
use crate::error::Result;

use super::{NamespacedName, ResourceStore};

/// Finalizer name for CephFilesystemSubVolumeGroup resources
pub const FINALIZER_NAME: &str = "cephfilesystemsubvolumegroup.ceph.rook.io";

/// Finalizer list with `name` appended, `None` if it is already present
pub fn with_finalizer(current: &[String], name: &str) -> Option<Vec<String>> {
    if current.iter().any(|f| f == name) {
        return None;
    }
    let mut finalizers = current.to_vec();
    finalizers.push(name.to_string());
    Some(finalizers)
}

/// Finalizer list with every `name` removed, `None` if it was absent
pub fn without_finalizer(current: &[String], name: &str) -> Option<Vec<String>> {
    if !current.iter().any(|f| f == name) {
        return None;
    }
    Some(current.iter().filter(|f| *f != name).cloned().collect())
}

/// Add the finalizer unless present. Returns whether a write happened.
pub async fn add_finalizer_if_not_present(
    store: &dyn ResourceStore,
    group: &CephFilesystemSubVolumeGroup,
) -> Result<bool> {
    let Some(finalizers) = with_finalizer(group.finalizers(), FINALIZER_NAME) else {
        return Ok(false);
    };
    debug!(name = %group.name_any(), finalizer = FINALIZER_NAME, "Adding finalizer");
    store.set_finalizers(group, finalizers).await?;
    Ok(true)
}

/// Remove the finalizer if present. Returns whether a write happened.
///
/// The object is fetched again first so the write carries its latest
/// resource version; an object that is already gone needs no removal.
pub async fn remove_finalizer(store: &dyn ResourceStore, identity: &NamespacedName) -> Result<bool> {
    let Some(group) = store.get_subvolume_group(identity).await? else {
        return Ok(false);
    };
    let Some(finalizers) = without_finalizer(group.finalizers(), FINALIZER_NAME) else {
        return Ok(false);
    };
    debug!(%identity, finalizer = FINALIZER_NAME, "Removing finalizer");
    store.set_finalizers(&group, finalizers).await?;
    Ok(true)
}
