//! Compute layer: container cluster and the load-balanced service
//!
//! The container environment carries live database attributes, which makes
//! the service transitively depend on the database resolving first. The
//! uploads volume additionally requires both mount targets to exist, so
//! those edges are explicit.

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::value::Value;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{
    ClusterSpec, ContainerSpec, EnvVar, MountPoint, NetworkConfig, PortMapping, ResourceSpec,
    ServiceSpec, VolumeSpec,
};

use super::storage::Storage;

/// Name of the task volume backed by the shared file system
const UPLOADS_VOLUME: &str = "service-volume";

/// Everything the service wires together.
pub struct ComputeInputs {
    pub vpc: ResourceId,
    pub cluster_sg: ResourceId,
    pub image: ResourceId,
    pub db: ResourceId,
    pub alb: ResourceId,
    pub storage: Storage,
}

pub fn declare(
    g: &mut ResourceGraph,
    inputs: &ComputeInputs,
    settings: &StackSettings,
) -> Result<(ResourceId, ResourceId), GraphError> {
    let cluster = g.add(
        "cluster",
        ResourceSpec::Cluster(ClusterSpec {
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    let spec = ServiceSpec {
        cluster_arn: g.ref_attr(cluster, "arn"),
        network: NetworkConfig {
            assign_public_ip: true,
            subnet_ids: g.ref_attr(inputs.vpc, "public_subnet_ids"),
            security_groups: vec![g.ref_attr(inputs.cluster_sg, "id")],
        },
        container: ContainerSpec {
            image: g.ref_attr(inputs.image, "image_uri"),
            cpu: settings.app_cpu,
            memory: settings.app_memory,
            port_mappings: vec![PortMapping {
                container_port: settings.app_port,
                target_group_arn: g.ref_attr(inputs.alb, "default_target_group_arn"),
            }],
            mount_points: vec![MountPoint {
                container_path: settings.uploads_mount_path(),
                source_volume: UPLOADS_VOLUME.to_string(),
            }],
            environment: environment(g, inputs.db, settings),
        },
        volumes: vec![VolumeSpec {
            name: UPLOADS_VOLUME.to_string(),
            file_system_id: g.ref_attr(inputs.storage.file_system, "id"),
            transit_encryption: true,
        }],
        tags: settings.tags.clone(),
    };

    // Both mount targets must attach before the task can mount the volume
    let service = g.add(
        "service",
        ResourceSpec::Service(spec),
        &inputs.storage.mount_targets,
    )?;

    Ok((cluster, service))
}

/// The fixed environment block. Database values are references resolved
/// after the instance is created; the port arrives stringly like every
/// other resolved attribute.
fn environment(g: &ResourceGraph, db: ResourceId, settings: &StackSettings) -> Vec<EnvVar> {
    vec![
        EnvVar {
            name: "DATABASE_CLIENT".to_string(),
            value: Value::lit(settings.db_engine.as_str()),
        },
        EnvVar {
            name: "DATABASE_HOST".to_string(),
            value: g.ref_attr(db, "address"),
        },
        EnvVar {
            name: "DATABASE_PORT".to_string(),
            value: g.ref_attr(db, "port"),
        },
        EnvVar {
            name: "DATABASE_NAME".to_string(),
            value: g.ref_attr(db, "db_name"),
        },
        EnvVar {
            name: "DATABASE_USERNAME".to_string(),
            value: g.ref_attr(db, "username"),
        },
        EnvVar {
            name: "DATABASE_PASSWORD".to_string(),
            value: g.ref_attr(db, "password"),
        },
        EnvVar {
            name: "DOCKER_DEFAULT_PLATFORM".to_string(),
            value: Value::lit("linux/amd64"),
        },
    ]
}
