//! CephFilesystemSubVolumeGroup controller
//!
//! Watches CephFilesystemSubVolumeGroup resources and triggers reconciliation.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        watcher::Config as WatcherConfig,
    },
    Api, Client, ResourceExt,
};
use tracing::{error, info, instrument};

use crate::controllers::Context;
use crate::crd::CephFilesystemSubVolumeGroup;
use crate::error::{Error, Result};
use crate::reconcilers::NamespacedName;

const KIND: &str = "CephFilesystemSubVolumeGroup";

/// Run the CephFilesystemSubVolumeGroup controller
pub async fn run(client: Client, watch_namespace: Option<String>, context: Arc<Context>) {
    let api: Api<CephFilesystemSubVolumeGroup> = match &watch_namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    };

    // Verify CRD is installed
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("CephFilesystemSubVolumeGroup CRD not installed: {}", e);
        return;
    }

    info!(
        namespace = watch_namespace.as_deref().unwrap_or("*"),
        "Starting CephFilesystemSubVolumeGroup controller"
    );

    let metrics = context.metrics.clone();
    Controller::new(api, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| {
            let metrics = metrics.clone();
            async move {
                match result {
                    Ok((obj, _action)) => {
                        info!(
                            name = %obj.name,
                            namespace = obj.namespace.as_deref().unwrap_or("default"),
                            "Reconciled CephFilesystemSubVolumeGroup"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Reconciliation error");
                        metrics.record_reconcile_error(KIND);
                    }
                }
            }
        })
        .await;
}

/// Main reconciliation function
#[instrument(skip(obj, ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<CephFilesystemSubVolumeGroup>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = ctx.metrics.start_reconcile(KIND);

    let identity = NamespacedName::from_resource(obj.as_ref());
    ctx.reconciler.reconcile(&identity).await
}

/// Error policy for the controller
pub fn error_policy(obj: Arc<CephFilesystemSubVolumeGroup>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!(
        name = %name,
        error = %error,
        "Reconciliation failed, scheduling retry"
    );

    Action::requeue(retry_delay(error))
}

/// Requeue delay for a failed reconciliation
fn retry_delay(error: &Error) -> Duration {
    match error {
        Error::Kube(_) => Duration::from_secs(30),
        Error::SubVolumeGroupNotEmpty { .. } => Duration::from_secs(60),
        Error::Config(_) => Duration::from_secs(300),
        _ => Duration::from_secs(30),
    }
}
