//! Error types for the CephFS SubVolumeGroup Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operator has no usable Ceph configuration yet
    #[error("operator is not initialized: {0}")]
    OperatorNotInitialized(String),

    /// Secret key not found
    #[error("Secret key '{key}' not found in secret '{secret}'")]
    SecretKeyNotFound { secret: String, key: String },

    /// A ceph command exited unsuccessfully
    #[error("ceph command '{command}' failed (exit status {code:?}): {stderr}")]
    CephCommand {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A ceph command refused to remove a directory that still has children
    #[error("ceph command '{command}' failed, directory not empty: {stderr}")]
    DirectoryNotEmpty { command: String, stderr: String },

    /// The owning CephFilesystem does not exist
    #[error("failed to fetch ceph filesystem {filesystem:?}, cannot create subvolumegroup {group:?}")]
    FilesystemNotFound { filesystem: String, group: String },

    /// Subvolume group creation failed
    #[error("failed to create ceph filesystem subvolume group {name:?}: {source}")]
    CreateSubVolumeGroup {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Subvolume group deletion failed
    #[error("failed to delete ceph filesystem subvolume group {name:?}: {source}")]
    DeleteSubVolumeGroup {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Subvolume group still holds subvolumes
    #[error("failed to delete ceph filesystem subvolume group {name:?}, remove the subvolumes first")]
    SubVolumeGroupNotEmpty {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an operator-not-initialized error
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Error::OperatorNotInitialized(msg.into())
    }

    /// Whether this error, or any error it wraps, means the operator's
    /// Ceph configuration is not initialized yet
    pub fn is_operator_not_initialized(&self) -> bool {
        match self {
            Error::OperatorNotInitialized(_) => true,
            Error::CreateSubVolumeGroup { source, .. }
            | Error::DeleteSubVolumeGroup { source, .. }
            | Error::SubVolumeGroupNotEmpty { source, .. } => source.is_operator_not_initialized(),
            _ => false,
        }
    }

    /// Whether this error reports a non-empty directory
    pub fn is_directory_not_empty(&self) -> bool {
        matches!(self, Error::DirectoryNotEmpty { .. })
    }
}
