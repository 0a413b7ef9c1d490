//! CephCluster readiness check

use async_trait::async_trait;
use kube::{api::ListParams, runtime::controller::Action, Api, Client, ResourceExt};
use tracing::{debug, error, info};

use crate::crd::CephCluster;
use crate::reconcilers::{ClusterReadiness, NamespacedName, ReadinessCheck, IMMEDIATE_RETRY, WAIT_FOR_REQUEUE};

/// Health detail reported while the operator cannot talk to ceph yet
const CLIENT_INIT_ERROR: &str = "Error initializing cluster client";

/// Decide readiness from the CephClusters found in a namespace
pub fn evaluate_clusters(clusters: &[CephCluster], identity: &NamespacedName) -> ReadinessCheck {
    let not_ready = |cluster_exists| ReadinessCheck {
        ready: false,
        cluster_exists,
        requeue: Action::requeue(WAIT_FOR_REQUEUE),
    };

    let Some(cluster) = clusters.first() else {
        debug!(namespace = %identity.namespace, "No CephCluster resource found");
        return not_ready(false);
    };

    // A cluster being destroyed along with its data counts as gone
    if cluster.metadata.deletion_timestamp.is_some() && cluster.spec.cleanup_policy.has_data_dir_clean_policy() {
        info!(
            cluster = %cluster.name_any(),
            %identity,
            "CephCluster has a destructive cleanup policy, allowing resource to be deleted"
        );
        return not_ready(false);
    }

    let Some(ceph) = cluster.status.as_ref().and_then(|s| s.ceph.as_ref()) else {
        debug!(cluster = %cluster.name_any(), "CephCluster initial reconcile is not complete yet");
        return not_ready(true);
    };

    let healthy = ceph.health == "HEALTH_OK" || ceph.health == "HEALTH_WARN";
    if healthy || cluster.spec.external.enable {
        debug!(health = %ceph.health, "Ceph cluster is ready to run ceph commands");
        return ReadinessCheck {
            ready: true,
            cluster_exists: true,
            requeue: Action::requeue(WAIT_FOR_REQUEUE),
        };
    }

    let initializing = ceph.details.len() == 1
        && ceph
            .details
            .get("error")
            .is_some_and(|d| d.message.contains(CLIENT_INIT_ERROR));
    if initializing {
        info!("Skipping reconcile since operator is still initializing");
    } else {
        info!(
            cluster = %cluster.name_any(),
            health = %ceph.health,
            "CephCluster found but skipping reconcile since ceph is not healthy"
        );
    }
    not_ready(true)
}

/// Readiness check listing CephClusters through the Kubernetes API
pub struct KubeClusterReadiness {
    client: Client,
}

impl KubeClusterReadiness {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterReadiness for KubeClusterReadiness {
    async fn check(&self, identity: &NamespacedName) -> ReadinessCheck {
        let api: Api<CephCluster> = Api::namespaced(self.client.clone(), &identity.namespace);
        let listed = api.list(&ListParams::default()).await.map(|list| list.items);
        evaluate_list(listed, identity)
    }
}

/// Decide readiness from the outcome of listing CephClusters.
///
/// A failed list says nothing about whether the cluster exists, so it is
/// reported as existing and retried right away.
pub fn evaluate_list(
    listed: std::result::Result<Vec<CephCluster>, kube::Error>,
    identity: &NamespacedName,
) -> ReadinessCheck {
    match listed {
        Ok(clusters) => evaluate_clusters(&clusters, identity),
        Err(e) => {
            error!(namespace = %identity.namespace, error = %e, "Failed to fetch CephCluster");
            ReadinessCheck {
                ready: false,
                cluster_exists: true,
                requeue: Action::requeue(IMMEDIATE_RETRY),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    use super::*;
    use crate::crd::{
        CephClusterSpec, CephClusterStatus, CephHealthMessage, CephHealthStatus, CleanupPolicySpec,
        DATA_DIR_CLEANUP_CONFIRMATION,
    };

    fn identity() -> NamespacedName {
        NamespacedName::new("rook-ceph", "csi")
    }

    fn cluster(health: Option<&str>) -> CephCluster {
        CephCluster {
            metadata: ObjectMeta {
                name: Some("rook-ceph".to_string()),
                namespace: Some("rook-ceph".to_string()),
                ..Default::default()
            },
            spec: CephClusterSpec::default(),
            status: health.map(|h| CephClusterStatus {
                phase: Some("Ready".to_string()),
                ceph: Some(CephHealthStatus {
                    health: h.to_string(),
                    details: BTreeMap::new(),
                }),
            }),
        }
    }

    #[test]
    fn no_cluster_means_gone() {
        let check = evaluate_clusters(&[], &identity());
        assert!(!check.ready);
        assert!(!check.cluster_exists);
        assert_eq!(check.requeue, Action::requeue(WAIT_FOR_REQUEUE));
    }

    #[test]
    fn healthy_cluster_is_ready() {
        for health in ["HEALTH_OK", "HEALTH_WARN"] {
            let check = evaluate_clusters(&[cluster(Some(health))], &identity());
            assert!(check.ready, "{} should be ready", health);
            assert!(check.cluster_exists);
        }
    }

    #[test]
    fn unhealthy_cluster_exists_but_is_not_ready() {
        let mut c = cluster(Some("HEALTH_ERR"));
        if let Some(ceph) = c.status.as_mut().and_then(|s| s.ceph.as_mut()) {
            ceph.details.insert(
                "error".to_string(),
                CephHealthMessage {
                    severity: "Urgent".to_string(),
                    message: "Error initializing cluster client: timed out".to_string(),
                },
            );
        }
        let check = evaluate_clusters(&[c], &identity());
        assert!(!check.ready);
        assert!(check.cluster_exists);
    }

    #[test]
    fn external_cluster_is_ready_regardless_of_health() {
        let mut c = cluster(Some("HEALTH_ERR"));
        c.spec.external.enable = true;
        assert!(evaluate_clusters(&[c], &identity()).ready);
    }

    #[test]
    fn cluster_without_status_is_still_initializing() {
        let check = evaluate_clusters(&[cluster(None)], &identity());
        assert!(!check.ready);
        assert!(check.cluster_exists);
    }

    #[test]
    fn destroyed_cluster_counts_as_gone() {
        let mut c = cluster(Some("HEALTH_OK"));
        c.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        c.spec.cleanup_policy = CleanupPolicySpec {
            confirmation: DATA_DIR_CLEANUP_CONFIRMATION.to_string(),
        };
        let check = evaluate_clusters(&[c], &identity());
        assert!(!check.ready);
        assert!(!check.cluster_exists);
    }

    #[test]
    fn failed_list_keeps_the_cluster_and_retries_right_away() {
        let err = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "etcdserver: request timed out".to_string(),
            reason: "Timeout".to_string(),
            code: 504,
        });
        let check = evaluate_list(Err(err), &identity());
        assert!(!check.ready);
        assert!(check.cluster_exists);
        assert_eq!(check.requeue, Action::requeue(IMMEDIATE_RETRY));
    }

    #[test]
    fn successful_list_is_evaluated() {
        let check = evaluate_list(Ok(vec![cluster(Some("HEALTH_OK"))]), &identity());
        assert!(check.ready);
    }
}
