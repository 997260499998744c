//! Network layer: the VPC every other resource lives in

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{ResourceSpec, VpcSpec};

/// Declare the virtual network. Public and private subnets are carved out
/// by the engine; the rest of the graph reaches them through
/// `public_subnet_ids` / `private_subnet_ids` references.
pub fn declare(g: &mut ResourceGraph, settings: &StackSettings) -> Result<ResourceId, GraphError> {
    g.add(
        "vpc",
        ResourceSpec::Vpc(VpcSpec {
            enable_dns_hostnames: true,
            enable_dns_support: true,
            tags: settings.tags.clone(),
        }),
        &[],
    )
}
