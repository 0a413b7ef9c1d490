//! CephFS SubVolumeGroup Kubernetes Operator
//!
//! This operator creates and removes CephFS subvolume groups declared through
//! the `CephFilesystemSubVolumeGroup` Custom Resource Definition.

pub mod adapters;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;

pub use error::{Error, Result};
