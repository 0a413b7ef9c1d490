//! Operator configuration loaded from the environment

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default metrics port
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default ceph binary
pub const DEFAULT_CEPH_BINARY: &str = "ceph";

/// Default directory for generated ceph config and keyring files
pub const DEFAULT_CONFIG_DIR: &str = "/var/lib/rook";

/// Runtime configuration for the operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Port for the metrics and health server
    pub metrics_port: u16,

    /// Namespace to watch (None = all namespaces)
    pub watch_namespace: Option<String>,

    /// Path or name of the ceph CLI
    pub ceph_binary: PathBuf,

    /// Base directory for per-cluster config files
    pub config_dir: PathBuf,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            watch_namespace: None,
            ceph_binary: PathBuf::from(DEFAULT_CEPH_BINARY),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let metrics_port = match non_empty(lookup("METRICS_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::config(format!("Invalid METRICS_PORT '{}': {}", raw, e)))?,
            None => defaults.metrics_port,
        };

        Ok(Self {
            metrics_port,
            watch_namespace: non_empty(lookup("WATCH_NAMESPACE")),
            ceph_binary: non_empty(lookup("ROOK_CEPH_BINARY"))
                .map(PathBuf::from)
                .unwrap_or(defaults.ceph_binary),
            config_dir: non_empty(lookup("ROOK_CONFIG_DIR"))
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = OperatorConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, OperatorConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = OperatorConfig::from_lookup(lookup_from(&[
            ("METRICS_PORT", "9090"),
            ("WATCH_NAMESPACE", "rook-ceph"),
            ("ROOK_CEPH_BINARY", "/usr/local/bin/ceph"),
            ("ROOK_CONFIG_DIR", "/tmp/rook"),
        ]))
        .unwrap();

        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.watch_namespace.as_deref(), Some("rook-ceph"));
        assert_eq!(config.ceph_binary, PathBuf::from("/usr/local/bin/ceph"));
        assert_eq!(config.config_dir, PathBuf::from("/tmp/rook"));
    }

    #[test]
    fn blank_namespace_means_all_namespaces() {
        let config = OperatorConfig::from_lookup(lookup_from(&[("WATCH_NAMESPACE", "  ")])).unwrap();
        assert!(config.watch_namespace.is_none());
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let err = OperatorConfig::from_lookup(lookup_from(&[("METRICS_PORT", "http")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("METRICS_PORT"));
    }
}
