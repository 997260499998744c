//! Access-control layer: four single-concern security groups
//!
//! Each group whitelists exactly the ports its concern needs and leaves
//! egress unrestricted. The engine rejects invalid rules at apply time;
//! nothing is validated or retried here.

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{FirewallRule, ResourceSpec, SecurityGroupSpec};

/// NFS port for the file-system mount targets
const NFS_PORT: u16 = 2049;

/// Handles to the four security groups.
#[derive(Debug, Clone, Copy)]
pub struct SecurityGroups {
    /// Load balancer: HTTP and HTTPS from anywhere
    pub alb: ResourceId,
    /// Compute service: the application port from anywhere
    pub cluster: ResourceId,
    /// Database: the engine-derived port from anywhere
    pub db: ResourceId,
    /// File system: NFS from anywhere
    pub fs: ResourceId,
}

pub fn declare(
    g: &mut ResourceGraph,
    vpc: ResourceId,
    settings: &StackSettings,
) -> Result<SecurityGroups, GraphError> {
    let alb = add_group(
        g,
        "alb-sg",
        vpc,
        vec![
            FirewallRule::tcp_from_anywhere(80),
            FirewallRule::tcp_from_anywhere(443),
        ],
        settings,
    )?;

    let cluster = add_group(
        g,
        "cluster-sg",
        vpc,
        vec![FirewallRule::tcp_from_anywhere(settings.app_port)],
        settings,
    )?;

    // Same derived port as the database instance itself
    let db = add_group(
        g,
        "db-sg",
        vpc,
        vec![FirewallRule::tcp_from_anywhere(settings.db_port())],
        settings,
    )?;

    let fs = add_group(
        g,
        "fs-sg",
        vpc,
        vec![FirewallRule::tcp_from_anywhere(NFS_PORT)],
        settings,
    )?;

    Ok(SecurityGroups {
        alb,
        cluster,
        db,
        fs,
    })
}

fn add_group(
    g: &mut ResourceGraph,
    name: &str,
    vpc: ResourceId,
    ingress: Vec<FirewallRule>,
    settings: &StackSettings,
) -> Result<ResourceId, GraphError> {
    let vpc_id = g.ref_attr(vpc, "vpc_id");
    g.add(
        name,
        ResourceSpec::SecurityGroup(SecurityGroupSpec {
            vpc_id,
            ingress,
            egress: vec![FirewallRule::allow_all_egress()],
            tags: settings.tags.clone(),
        }),
        &[],
    )
}
