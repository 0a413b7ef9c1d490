//! Ceph cluster connection context
//!
//! Reads the monitor secret and endpoints config map the cluster
//! publishes in its namespace.

use async_trait::async_trait;
use kube::Client;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reconcilers::ClusterInfoLoader;

use super::secrets::{get_config_map, get_secret, get_secret_string, get_secret_string_any};

/// Secret holding the cluster fsid and admin credentials
pub const MON_SECRET_NAME: &str = "rook-ceph-mon";

/// Config map holding the monitor endpoints
pub const MON_ENDPOINTS_CONFIG_MAP_NAME: &str = "rook-ceph-mon-endpoints";

/// Key of the endpoints list in the config map
pub const MON_ENDPOINTS_KEY: &str = "data";

/// Ceph user used when the secret does not name one
pub const DEFAULT_CEPH_USER: &str = "client.admin";

/// Everything needed to run ceph commands against one cluster
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    /// Namespace of the cluster, also used as the ceph cluster name
    pub namespace: String,
    pub fsid: String,
    /// Monitor addresses, `host:port`
    pub mon_endpoints: Vec<String>,
    /// Ceph user, e.g. `client.admin`
    pub user: String,
    /// Ceph key of `user`
    pub key: String,
}

impl std::fmt::Debug for ClusterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterInfo")
            .field("namespace", &self.namespace)
            .field("fsid", &self.fsid)
            .field("mon_endpoints", &self.mon_endpoints)
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Parse the `a=10.0.0.1:6789,b=10.0.0.2:6789` monitor list
pub fn parse_mon_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((_, addr)) => addr.trim().to_string(),
            None => entry.to_string(),
        })
        .filter(|addr| !addr.is_empty())
        .collect()
}

/// Use the default ceph user when the secret does not name one.
/// Any other failure reading the key is returned.
pub fn user_or_default(user: Result<String>) -> Result<String> {
    match user {
        Err(Error::SecretKeyNotFound { .. }) => Ok(DEFAULT_CEPH_USER.to_string()),
        other => other,
    }
}

/// Loads [`ClusterInfo`] from the Kubernetes API
pub struct KubeClusterInfoLoader {
    client: Client,
}

impl KubeClusterInfoLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterInfoLoader for KubeClusterInfoLoader {
    async fn load(&self, namespace: &str) -> Result<ClusterInfo> {
        let secret = get_secret(&self.client, MON_SECRET_NAME, namespace)
            .await?
            .ok_or_else(|| {
                Error::not_initialized(format!(
                    "secret {}/{} does not exist yet",
                    namespace, MON_SECRET_NAME
                ))
            })?;

        let fsid = get_secret_string(&secret, "fsid")?;
        let user = user_or_default(get_secret_string(&secret, "ceph-username"))?;
        let key = get_secret_string_any(&secret, &["ceph-secret", "admin-secret"])?;

        let mon_endpoints = get_config_map(&self.client, MON_ENDPOINTS_CONFIG_MAP_NAME, namespace)
            .await?
            .and_then(|cm| cm.data)
            .and_then(|data| data.get(MON_ENDPOINTS_KEY).map(|raw| parse_mon_endpoints(raw)))
            .unwrap_or_default();

        if mon_endpoints.is_empty() {
            return Err(Error::not_initialized(format!(
                "no monitor endpoints published in {}/{}",
                namespace, MON_ENDPOINTS_CONFIG_MAP_NAME
            )));
        }

        debug!(namespace, fsid = %fsid, mons = mon_endpoints.len(), "Loaded cluster info");

        Ok(ClusterInfo {
            namespace: namespace.to_string(),
            fsid,
            mon_endpoints,
            user,
            key,
        })
    }
}
