//! Load balancer layer: public entry point with the default target group

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{HealthCheck, LoadBalancerSpec, ResourceSpec, TargetGroupSpec};

/// Health-check success range: anything short of a server error counts,
/// since Strapi redirects `/` to the admin panel.
const HEALTH_CHECK_MATCHER: &str = "200-399";

pub fn declare(
    g: &mut ResourceGraph,
    vpc: ResourceId,
    alb_sg: ResourceId,
    settings: &StackSettings,
) -> Result<ResourceId, GraphError> {
    let subnet_ids = g.ref_attr(vpc, "public_subnet_ids");
    let sg_id = g.ref_attr(alb_sg, "id");
    g.add(
        "alb",
        ResourceSpec::LoadBalancer(LoadBalancerSpec {
            subnet_ids,
            security_groups: vec![sg_id],
            default_target_group: TargetGroupSpec {
                port: settings.app_port,
                // Required for tasks on an awsvpc network
                target_type: "ip".to_string(),
                health_check: HealthCheck {
                    path: "/".to_string(),
                    matcher: HEALTH_CHECK_MATCHER.to_string(),
                },
            },
            tags: settings.tags.clone(),
        }),
        &[],
    )
}
