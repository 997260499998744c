//! Shared storage layer: file system plus two mount targets
//!
//! One mount target per designated subnet. Both must exist before the
//! compute service can attach the volume; the service carries explicit
//! edges on both.

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{FileSystemSpec, MountTargetSpec, ResourceSpec};

/// Handles to the storage resources.
#[derive(Debug, Clone, Copy)]
pub struct Storage {
    pub file_system: ResourceId,
    pub mount_targets: [ResourceId; 2],
}

pub fn declare(
    g: &mut ResourceGraph,
    vpc: ResourceId,
    fs_sg: ResourceId,
    settings: &StackSettings,
) -> Result<Storage, GraphError> {
    let file_system = g.add(
        "fs",
        ResourceSpec::FileSystem(FileSystemSpec {
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    let mut mount_targets = [file_system; 2];
    for (i, slot) in mount_targets.iter_mut().enumerate() {
        let file_system_id = g.ref_attr(file_system, "id");
        let subnet_id = g.ref_attr(vpc, format!("public_subnet_ids.{i}"));
        let sg_id = g.ref_attr(fs_sg, "id");
        *slot = g.add(
            format!("fs-{}", i + 1),
            ResourceSpec::MountTarget(MountTargetSpec {
                file_system_id,
                subnet_id,
                security_groups: vec![sg_id],
            }),
            &[],
        )?;
    }

    Ok(Storage {
        file_system,
        mount_targets,
    })
}
