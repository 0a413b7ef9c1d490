//! CRD YAML Generator
//!
//! This binary generates the Kubernetes CRD manifest for the
//! CephFilesystemSubVolumeGroup resource.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/subvolumegroup.yaml

use ceph_subvolumegroup_operator::crd::generate_crds;

fn main() -> Result<(), serde_yaml::Error> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
