//! Best-effort status updates for subvolume groups

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::crd::{CephFilesystemSubVolumeGroupStatus, ConditionType};

use super::{NamespacedName, ResourceStore};

/// Set the phase of a subvolume group.
///
/// The object is fetched again right before writing. A missing object is
/// skipped, and failures are logged rather than returned.
pub async fn update_status(store: &dyn ResourceStore, identity: &NamespacedName, phase: ConditionType) {
    let group = match store.get_subvolume_group(identity).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            debug!(%identity, "CephFilesystemSubVolumeGroup resource not found. Ignoring since object must be deleted");
            return;
        }
        Err(e) => {
            warn!(%identity, %phase, error = %e, "Failed to retrieve ceph filesystem subvolume group to update status");
            return;
        }
    };

    let status = CephFilesystemSubVolumeGroupStatus::transition(
        group.status.as_ref(),
        phase,
        group.metadata.generation,
        Utc::now(),
    );

    if let Err(e) = store.patch_status(identity, &status).await {
        error!(%identity, %phase, error = %e, "Failed to set ceph filesystem subvolume group status");
        return;
    }

    debug!(%identity, %phase, "Ceph filesystem subvolume group status updated");
}
