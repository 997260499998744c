//! Data layer: subnet group and managed database instance

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::value::Value;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{DbInstanceSpec, DbSubnetGroupSpec, ResourceSpec};

/// Declare the database, placed in the private subnets behind the database
/// security group. `db_password` is the already-resolved secret (configured
/// or generated-and-persisted).
pub fn declare(
    g: &mut ResourceGraph,
    vpc: ResourceId,
    db_sg: ResourceId,
    settings: &StackSettings,
    db_password: &str,
) -> Result<(ResourceId, ResourceId), GraphError> {
    let private_subnets = g.ref_attr(vpc, "private_subnet_ids");
    let subnet_group = g.add(
        "db-subnet-group",
        ResourceSpec::DbSubnetGroup(DbSubnetGroupSpec {
            subnet_ids: private_subnets,
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    let subnet_group_name = g.ref_attr(subnet_group, "name");
    let sg_id = g.ref_attr(db_sg, "id");
    let db = g.add(
        "db",
        ResourceSpec::DbInstance(DbInstanceSpec {
            engine: settings.db_engine.as_str().to_string(),
            instance_class: settings.db_instance_class.clone(),
            allocated_storage: settings.db_storage,
            db_name: settings.db_name.clone(),
            username: settings.db_username.clone(),
            password: Value::secret(db_password),
            db_subnet_group_name: subnet_group_name,
            skip_final_snapshot: true,
            vpc_security_group_ids: vec![sg_id],
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    Ok((subnet_group, db))
}
