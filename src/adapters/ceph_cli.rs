//! Ceph CLI backed storage client
//!
//! Runs `ceph fs subvolumegroup ...` commands against the cluster described
//! by a [`ClusterInfo`].

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::reconcilers::CephClient;

use super::ceph_config_files::CephConfigFiles;
use super::cluster_info::ClusterInfo;

/// Message printed by ceph when its config file cannot be read
pub const UNINITIALIZED_CEPH_CONFIG_ERROR: &str = "error calling conf_read_file";

/// Exit status of a command failing with ENOTEMPTY
pub const ENOTEMPTY: i32 = 39;

/// Storage client shelling out to the ceph binary
pub struct CephCli {
    binary: PathBuf,
    config_dir: PathBuf,
}

impl CephCli {
    pub fn new(binary: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Run a ceph command, returning its stdout
    async fn run(&self, info: &ClusterInfo, args: &[&str]) -> Result<String> {
        let files = CephConfigFiles::write(info, &self.config_dir)?;
        let command = args.join(" ");
        debug!(command = %command, namespace = %info.namespace, "Running ceph command");

        let output = Command::new(&self.binary)
            .args(args)
            .arg(format!("--cluster={}", info.namespace))
            .arg(format!("--conf={}", files.config_path.display()))
            .arg(format!("--name={}", info.user))
            .arg(format!("--keyring={}", files.keyring_path.display()))
            .arg("--format")
            .arg("json")
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            return Ok(stdout);
        }

        warn!(command = %command, code = ?output.status.code(), stderr = %stderr.trim(), "Ceph command failed");
        Err(classify_failure(command, output.status.code(), stderr))
    }
}

/// Map a failed command to the matching error kind
pub fn classify_failure(command: String, code: Option<i32>, stderr: String) -> Error {
    if stderr.contains(UNINITIALIZED_CEPH_CONFIG_ERROR) {
        return Error::not_initialized(stderr.trim().to_string());
    }
    if code == Some(ENOTEMPTY) || stderr.contains("ENOTEMPTY") {
        return Error::DirectoryNotEmpty { command, stderr };
    }
    Error::CephCommand {
        command,
        code,
        stderr,
    }
}

#[async_trait]
impl CephClient for CephCli {
    async fn create_subvolume_group(
        &self,
        info: &ClusterInfo,
        filesystem: &str,
        group: &str,
    ) -> Result<()> {
        self.run(info, &["fs", "subvolumegroup", "create", filesystem, group])
            .await?;
        Ok(())
    }

    async fn delete_subvolume_group(
        &self,
        info: &ClusterInfo,
        filesystem: &str,
        group: &str,
    ) -> Result<()> {
        // --force makes removing an absent group succeed
        self.run(info, &["fs", "subvolumegroup", "rm", filesystem, group, "--force"])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_config_wins_over_exit_code() {
        let err = classify_failure(
            "fs subvolumegroup create myfs csi".to_string(),
            Some(1),
            "global_init: error calling conf_read_file: errno ENOENT".to_string(),
        );
        assert!(err.is_operator_not_initialized());
    }

    #[test]
    fn enotempty_exit_status_is_directory_not_empty() {
        let err = classify_failure("fs subvolumegroup rm myfs csi".to_string(), Some(ENOTEMPTY), String::new());
        assert!(err.is_directory_not_empty());

        let err = classify_failure(
            "fs subvolumegroup rm myfs csi".to_string(),
            Some(1),
            "Error ENOTEMPTY: error in rmdir /volumes/csi".to_string(),
        );
        assert!(err.is_directory_not_empty());
    }

    #[test]
    fn other_failures_are_generic() {
        let err = classify_failure(
            "fs subvolumegroup create myfs csi".to_string(),
            Some(2),
            "Error ENOENT: filesystem 'myfs' not found".to_string(),
        );
        assert!(matches!(err, Error::CephCommand { code: Some(2), .. }));
    }

    fn cluster_info() -> ClusterInfo {
        ClusterInfo {
            namespace: "rook-ceph".to_string(),
            fsid: "fsid".to_string(),
            mon_endpoints: vec!["10.0.0.1:6789".to_string()],
            user: "client.admin".to_string(),
            key: "AQB==".to_string(),
        }
    }

    /// Write an executable shell script standing in for the ceph binary
    #[cfg(unix)]
    fn fake_ceph(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-ceph");
        std::fs::write(&script, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_the_binary_with_cluster_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ceph(
            dir.path(),
            "if [ \"$3\" = \"rm\" ]; then\n\
               echo 'Error ENOTEMPTY: error in rmdir /volumes/csi' >&2\n\
               exit 39\n\
             fi\n\
             echo \"$@\"\n",
        );

        let cli = CephCli::new(&script, dir.path().join("conf"));
        let info = cluster_info();

        let stdout = cli
            .run(&info, &["fs", "subvolumegroup", "create", "myfs", "csi"])
            .await
            .unwrap();
        assert!(stdout.starts_with("fs subvolumegroup create myfs csi --cluster=rook-ceph"));
        assert!(stdout.contains("--name=client.admin"));
        assert!(stdout.contains("--format json"));

        let err = cli
            .delete_subvolume_group(&info, "myfs", "csi")
            .await
            .unwrap_err();
        assert!(err.is_directory_not_empty());
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_commands_see_complete_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_ceph(
            dir.path(),
            "for arg in \"$@\"; do\n\
               case \"$arg\" in\n\
                 --conf=*) conf=\"${arg#--conf=}\" ;;\n\
                 --keyring=*) keyring=\"${arg#--keyring=}\" ;;\n\
               esac\n\
             done\n\
             grep -q mon_host \"$conf\" || { echo 'conf missing mon_host' >&2; exit 1; }\n\
             grep -q 'key = ' \"$keyring\" || { echo 'keyring empty' >&2; exit 1; }\n",
        );

        let cli = std::sync::Arc::new(CephCli::new(&script, dir.path().join("conf")));
        let info = cluster_info();

        for _ in 0..5 {
            let runs = (0..32).map(|i| {
                let cli = cli.clone();
                let info = info.clone();
                tokio::spawn(async move {
                    cli.create_subvolume_group(&info, "myfs", &format!("group-{}", i))
                        .await
                })
            });
            for result in futures::future::join_all(runs).await {
                result.unwrap().unwrap();
            }
        }

        // Every command removed its files once done
        let left = std::fs::read_dir(dir.path().join("conf").join("rook-ceph"))
            .unwrap()
            .count();
        assert_eq!(left, 0);
    }
}
