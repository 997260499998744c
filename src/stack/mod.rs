//! Stack composition
//!
//! Single-pass assembly of the full resource graph, components in
//! dependency order: network, image pipeline, access control, data layer,
//! load balancer, shared storage, compute, and the optional DNS/TLS chain.
//! The result is a [`StackPlan`] ready to be rendered for the provisioning
//! engine.

pub mod compute;
pub mod database;
pub mod dns;
pub mod loadbalancer;
pub mod network;
pub mod registry;
pub mod security;
pub mod storage;

use tracing::info;

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::value::Value;
use crate::graph::{ResourceGraph, ResourceId};

pub use dns::{DnsChain, DnsSetup};
pub use security::SecurityGroups;
pub use storage::Storage;

/// Handles to every declared resource, for wiring and assertions.
#[derive(Debug)]
pub struct StackResources {
    pub vpc: ResourceId,
    pub repository: ResourceId,
    pub image: ResourceId,
    pub security_groups: SecurityGroups,
    pub db_subnet_group: ResourceId,
    pub db: ResourceId,
    pub alb: ResourceId,
    pub storage: Storage,
    pub cluster: ResourceId,
    pub service: ResourceId,
}

/// The fully assembled plan for one stack.
#[derive(Debug)]
pub struct StackPlan {
    pub name: String,
    pub graph: ResourceGraph,
    pub resources: StackResources,
    pub dns: DnsSetup,
    url: Value,
}

impl StackPlan {
    /// Public URL of the deployed application: the HTTPS custom-domain
    /// form when the DNS chain exists, otherwise plain HTTP on the load
    /// balancer's generated DNS name. Derived, never stored.
    pub fn url(&self) -> &Value {
        &self.url
    }
}

/// Build the plan. `db_password` must already be resolved (configured or
/// generated-and-persisted) so graph construction stays pure.
pub fn build(
    name: &str,
    settings: &StackSettings,
    db_password: &str,
) -> Result<StackPlan, GraphError> {
    let mut graph = ResourceGraph::new();
    let g = &mut graph;

    let vpc = network::declare(g, settings)?;
    let (repository, image) = registry::declare(g, settings)?;
    let security_groups = security::declare(g, vpc, settings)?;
    let (db_subnet_group, db) =
        database::declare(g, vpc, security_groups.db, settings, db_password)?;
    let alb = loadbalancer::declare(g, vpc, security_groups.alb, settings)?;
    let storage = storage::declare(g, vpc, security_groups.fs, settings)?;
    let (cluster, service) = compute::declare(
        g,
        &compute::ComputeInputs {
            vpc,
            cluster_sg: security_groups.cluster,
            image,
            db,
            alb,
            storage,
        },
        settings,
    )?;
    let dns = dns::declare(g, alb, settings)?;

    let url = resolve_url(g, alb, &dns);
    info!(
        stack = name,
        resources = g.len(),
        url = %url,
        "Stack plan assembled"
    );

    Ok(StackPlan {
        name: name.to_string(),
        graph,
        resources: StackResources {
            vpc,
            repository,
            image,
            security_groups,
            db_subnet_group,
            db,
            alb,
            storage,
            cluster,
            service,
        },
        dns,
        url,
    })
}

fn resolve_url(g: &ResourceGraph, alb: ResourceId, dns: &DnsSetup) -> Value {
    match dns {
        DnsSetup::CustomDomain(chain) => Value::lit(format!("https://{}", chain.fqdn)),
        DnsSetup::PlainHttp => {
            Value::Concat(vec![Value::lit("http://"), g.ref_attr(alb, "dns_name")])
        }
    }
}
