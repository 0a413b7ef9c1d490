//! Ceph config and keyring file management
//!
//! The ceph CLI reads the monitor addresses from a config file and the
//! credentials from a keyring. Both are rendered from a [`ClusterInfo`] into
//! a private directory under `<base_dir>/<namespace>/`, one per command, so
//! concurrent commands never read each other's half-written files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

use super::cluster_info::ClusterInfo;

/// Files written for one ceph command, removed on drop
pub struct CephConfigFiles {
    /// Per-command directory, owner access only
    dir: TempDir,
    /// Path to the ceph config file
    pub config_path: PathBuf,
    /// Path to the keyring file
    pub keyring_path: PathBuf,
}

impl CephConfigFiles {
    /// Write the config and keyring for a cluster under `base_dir`
    pub fn write(info: &ClusterInfo, base_dir: &Path) -> Result<Self> {
        let parent = base_dir.join(&info.namespace);
        fs::create_dir_all(&parent)?;
        let dir = tempfile::Builder::new().prefix("ceph-").tempdir_in(&parent)?;

        let config_path = dir.path().join(format!("{}.config", info.namespace));
        let keyring_path = dir.path().join(format!("{}.keyring", info.user));

        write_file(&keyring_path, &render_keyring(info))?;
        write_file(&config_path, &render_config(info, &keyring_path))?;

        Ok(Self {
            dir,
            config_path,
            keyring_path,
        })
    }

    /// Directory holding the files
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Render the `[global]` config for a cluster
pub fn render_config(info: &ClusterInfo, keyring_path: &Path) -> String {
    format!(
        "[global]\n\
         fsid = {fsid}\n\
         mon_host = {mons}\n\
         \n\
         [{user}]\n\
         keyring = {keyring}\n",
        fsid = info.fsid,
        mons = info.mon_endpoints.join(","),
        user = info.user,
        keyring = keyring_path.display(),
    )
}

/// Render the keyring for the cluster user
pub fn render_keyring(info: &ClusterInfo) -> String {
    format!("[{}]\nkey = {}\n", info.user, info.key)
}

/// Create a new file readable by the owner only and write content to it
fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cluster_info() -> ClusterInfo {
        ClusterInfo {
            namespace: "rook-ceph".to_string(),
            fsid: "4a9a8b2c-0000-4000-8000-000000000001".to_string(),
            mon_endpoints: vec!["10.0.0.1:6789".to_string(), "10.0.0.2:6789".to_string()],
            user: "client.admin".to_string(),
            key: "AQBtestkey==".to_string(),
        }
    }

    #[test]
    fn writes_config_and_keyring() {
        let dir = tempdir().unwrap();
        let files = CephConfigFiles::write(&cluster_info(), dir.path()).unwrap();

        assert!(files.dir().starts_with(dir.path().join("rook-ceph")));
        assert_eq!(files.config_path, files.dir().join("rook-ceph.config"));
        let config = fs::read_to_string(&files.config_path).unwrap();
        assert!(config.contains("mon_host = 10.0.0.1:6789,10.0.0.2:6789"));
        assert!(config.contains(&format!("keyring = {}", files.keyring_path.display())));

        let keyring = fs::read_to_string(&files.keyring_path).unwrap();
        assert_eq!(keyring, "[client.admin]\nkey = AQBtestkey==\n");
    }

    #[cfg(unix)]
    #[test]
    fn keyring_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let files = CephConfigFiles::write(&cluster_info(), dir.path()).unwrap();
        let mode = fs::metadata(&files.keyring_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let dir_mode = fs::metadata(files.dir()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o077, 0);
    }

    #[test]
    fn removes_files_on_drop() {
        let dir = tempdir().unwrap();
        let files = CephConfigFiles::write(&cluster_info(), dir.path()).unwrap();
        let written = files.dir().to_path_buf();
        assert!(files.config_path.exists());

        drop(files);
        assert!(!written.exists());
        assert!(dir.path().join("rook-ceph").exists());
    }

    #[test]
    fn each_write_gets_its_own_directory() {
        let dir = tempdir().unwrap();
        let mut info = cluster_info();
        let first = CephConfigFiles::write(&info, dir.path()).unwrap();

        info.mon_endpoints = vec!["10.0.0.9:3300".to_string()];
        let second = CephConfigFiles::write(&info, dir.path()).unwrap();

        assert_ne!(first.dir(), second.dir());
        let config = fs::read_to_string(&first.config_path).unwrap();
        assert!(config.contains("mon_host = 10.0.0.1:6789,10.0.0.2:6789\n"));
        let config = fs::read_to_string(&second.config_path).unwrap();
        assert!(config.contains("mon_host = 10.0.0.9:3300\n"));
    }
}
