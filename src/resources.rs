//! Typed resource specifications
//!
//! One struct per declared resource kind, serialized verbatim into the
//! engine document. Cross-resource wiring uses [`Value`] references so the
//! graph can derive ordering edges from data flow.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::graph::value::Value;
use crate::graph::ResourceId;

/// Provider tags applied to every resource that supports tagging.
pub type Tags = BTreeMap<String, String>;

/// Resource kinds, as the engine document names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vpc,
    Repository,
    Image,
    SecurityGroup,
    DbSubnetGroup,
    DbInstance,
    FileSystem,
    MountTarget,
    LoadBalancer,
    Cluster,
    Service,
    HostedZoneLookup,
    Certificate,
    DnsRecord,
    CertificateValidation,
    Listener,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Repository => "repository",
            ResourceKind::Image => "image",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::DbSubnetGroup => "db-subnet-group",
            ResourceKind::DbInstance => "db-instance",
            ResourceKind::FileSystem => "file-system",
            ResourceKind::MountTarget => "mount-target",
            ResourceKind::LoadBalancer => "load-balancer",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Service => "service",
            ResourceKind::HostedZoneLookup => "hosted-zone-lookup",
            ResourceKind::Certificate => "certificate",
            ResourceKind::DnsRecord => "dns-record",
            ResourceKind::CertificateValidation => "certificate-validation",
            ResourceKind::Listener => "listener",
        }
    }

    /// Read-only data sources are looked up, not created; the engine fails
    /// the apply if they do not exist.
    pub fn is_lookup(self) -> bool {
        matches!(self, ResourceKind::HostedZoneLookup)
    }
}

/// Virtual network with public and private subnets.
///
/// Exposes `vpc_id`, `public_subnet_ids` and `private_subnet_ids` to the
/// rest of the graph.
#[derive(Debug, Clone, Serialize)]
pub struct VpcSpec {
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Container registry for the application image.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySpec {
    pub force_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Build-and-push of the application image from a local context path.
/// The build itself is the pipeline's job; this node only declares it.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSpec {
    pub repository_url: Value,
    pub context_path: String,
}

/// A single ingress or egress rule.
#[derive(Debug, Clone, Serialize)]
pub struct FirewallRule {
    pub from_port: u16,
    pub to_port: u16,
    pub protocol: String,
    pub cidr_blocks: Vec<String>,
}

impl FirewallRule {
    /// Allow one TCP port from anywhere.
    pub fn tcp_from_anywhere(port: u16) -> Self {
        Self {
            from_port: port,
            to_port: port,
            protocol: "tcp".to_string(),
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }

    /// Unrestricted egress: protocol `-1`, all ports, everywhere.
    pub fn allow_all_egress() -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }
}

/// Whitelist traffic policy scoped to a single concern.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityGroupSpec {
    pub vpc_id: Value,
    pub ingress: Vec<FirewallRule>,
    pub egress: Vec<FirewallRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Placement of the database instance inside the private subnets.
#[derive(Debug, Clone, Serialize)]
pub struct DbSubnetGroupSpec {
    pub subnet_ids: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Managed relational database instance.
///
/// Exposes `address`, `port`, `db_name`, `username` and `password`.
#[derive(Debug, Clone, Serialize)]
pub struct DbInstanceSpec {
    pub engine: String,
    pub instance_class: String,
    pub allocated_storage: u32,
    pub db_name: String,
    pub username: String,
    pub password: Value,
    pub db_subnet_group_name: Value,
    pub skip_final_snapshot: bool,
    pub vpc_security_group_ids: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Shared network file system. Exposes `id`.
#[derive(Debug, Clone, Serialize)]
pub struct FileSystemSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Per-subnet endpoint for the file system. Mount targets do not support
/// tags.
#[derive(Debug, Clone, Serialize)]
pub struct MountTargetSpec {
    pub file_system_id: Value,
    pub subnet_id: Value,
    pub security_groups: Vec<Value>,
}

/// Health check for the default target group.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub path: String,
    pub matcher: String,
}

/// Default target group the service registers into. IP target type is
/// required for containers on an `awsvpc` network.
#[derive(Debug, Clone, Serialize)]
pub struct TargetGroupSpec {
    pub port: u16,
    pub target_type: String,
    pub health_check: HealthCheck,
}

/// Public application load balancer.
///
/// Exposes `dns_name`, `zone_id`, `arn` and `default_target_group_arn`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadBalancerSpec {
    pub subnet_ids: Value,
    pub security_groups: Vec<Value>,
    pub default_target_group: TargetGroupSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Container cluster. Exposes `arn`.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Container environment variable.
#[derive(Debug, Clone, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: Value,
}

/// Binding of the container port to a load-balancer target group.
#[derive(Debug, Clone, Serialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub target_group_arn: Value,
}

/// Bind of a named volume into the container filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct MountPoint {
    pub container_path: String,
    pub source_volume: String,
}

/// Task volume backed by the shared file system.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSpec {
    pub name: String,
    pub file_system_id: Value,
    pub transit_encryption: bool,
}

/// Network placement of the service tasks.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkConfig {
    pub assign_public_ip: bool,
    pub subnet_ids: Value,
    pub security_groups: Vec<Value>,
}

/// The single application container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSpec {
    pub image: Value,
    pub cpu: u32,
    pub memory: u32,
    pub port_mappings: Vec<PortMapping>,
    pub mount_points: Vec<MountPoint>,
    pub environment: Vec<EnvVar>,
}

/// Load-balanced container service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSpec {
    pub cluster_arn: Value,
    pub network: NetworkConfig,
    pub container: ContainerSpec,
    pub volumes: Vec<VolumeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Read-only lookup of the hosted zone for a custom domain. Exposes
/// `zone_id`. A missing zone is a fatal apply-time error.
#[derive(Debug, Clone, Serialize)]
pub struct HostedZoneLookupSpec {
    pub domain: String,
}

/// DNS-validated TLS certificate for the fully-qualified name.
///
/// Exposes `arn` and `domain_validation_options.0.{resource_record_name,
/// resource_record_type, resource_record_value}`.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateSpec {
    pub domain_name: String,
    pub validation_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Alias target for an A-record pointing at the load balancer.
#[derive(Debug, Clone, Serialize)]
pub struct AliasTarget {
    pub name: Value,
    pub zone_id: Value,
    pub evaluate_target_health: bool,
}

/// DNS record: either a plain record (`records` + `ttl`) or an alias
/// (`aliases`), matching what the validation record and the production
/// A-record each need. Exposes `fqdn`.
#[derive(Debug, Clone, Serialize)]
pub struct DnsRecordSpec {
    pub zone_id: Value,
    pub name: Value,
    pub record_type: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasTarget>,
}

/// Wait for certificate validation to complete via the published record.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateValidationSpec {
    pub certificate_arn: Value,
    pub validation_record_fqdns: Vec<Value>,
}

/// Forwarding action of a listener.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub target_group_arn: Value,
}

/// HTTPS listener on the load balancer.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerSpec {
    pub load_balancer_arn: Value,
    pub port: u16,
    pub protocol: String,
    pub certificate_arn: Value,
    pub default_actions: Vec<ListenerAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Union of every spec the graph can hold.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    Vpc(VpcSpec),
    Repository(RepositorySpec),
    Image(ImageSpec),
    SecurityGroup(SecurityGroupSpec),
    DbSubnetGroup(DbSubnetGroupSpec),
    DbInstance(DbInstanceSpec),
    FileSystem(FileSystemSpec),
    MountTarget(MountTargetSpec),
    LoadBalancer(LoadBalancerSpec),
    Cluster(ClusterSpec),
    Service(ServiceSpec),
    HostedZoneLookup(HostedZoneLookupSpec),
    Certificate(CertificateSpec),
    DnsRecord(DnsRecordSpec),
    CertificateValidation(CertificateValidationSpec),
    Listener(ListenerSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Vpc(_) => ResourceKind::Vpc,
            ResourceSpec::Repository(_) => ResourceKind::Repository,
            ResourceSpec::Image(_) => ResourceKind::Image,
            ResourceSpec::SecurityGroup(_) => ResourceKind::SecurityGroup,
            ResourceSpec::DbSubnetGroup(_) => ResourceKind::DbSubnetGroup,
            ResourceSpec::DbInstance(_) => ResourceKind::DbInstance,
            ResourceSpec::FileSystem(_) => ResourceKind::FileSystem,
            ResourceSpec::MountTarget(_) => ResourceKind::MountTarget,
            ResourceSpec::LoadBalancer(_) => ResourceKind::LoadBalancer,
            ResourceSpec::Cluster(_) => ResourceKind::Cluster,
            ResourceSpec::Service(_) => ResourceKind::Service,
            ResourceSpec::HostedZoneLookup(_) => ResourceKind::HostedZoneLookup,
            ResourceSpec::Certificate(_) => ResourceKind::Certificate,
            ResourceSpec::DnsRecord(_) => ResourceKind::DnsRecord,
            ResourceSpec::CertificateValidation(_) => ResourceKind::CertificateValidation,
            ResourceSpec::Listener(_) => ResourceKind::Listener,
        }
    }

    /// Every resource referenced by a [`Value`] inside this spec; each
    /// becomes an ordering edge when the spec is registered.
    pub fn refs(&self) -> Vec<ResourceId> {
        let mut values: Vec<&Value> = Vec::new();
        self.collect_values(&mut values);
        let mut out: Vec<ResourceId> = values.iter().flat_map(|v| v.refs()).collect();
        out.sort_unstable_by_key(|id| id.0);
        out.dedup();
        out
    }

    fn collect_values<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            ResourceSpec::Vpc(_)
            | ResourceSpec::Repository(_)
            | ResourceSpec::FileSystem(_)
            | ResourceSpec::Cluster(_)
            | ResourceSpec::HostedZoneLookup(_)
            | ResourceSpec::Certificate(_) => {}
            ResourceSpec::Image(s) => out.push(&s.repository_url),
            ResourceSpec::SecurityGroup(s) => out.push(&s.vpc_id),
            ResourceSpec::DbSubnetGroup(s) => out.push(&s.subnet_ids),
            ResourceSpec::DbInstance(s) => {
                out.push(&s.password);
                out.push(&s.db_subnet_group_name);
                out.extend(&s.vpc_security_group_ids);
            }
            ResourceSpec::MountTarget(s) => {
                out.push(&s.file_system_id);
                out.push(&s.subnet_id);
                out.extend(&s.security_groups);
            }
            ResourceSpec::LoadBalancer(s) => {
                out.push(&s.subnet_ids);
                out.extend(&s.security_groups);
            }
            ResourceSpec::Service(s) => {
                out.push(&s.cluster_arn);
                out.push(&s.network.subnet_ids);
                out.extend(&s.network.security_groups);
                out.push(&s.container.image);
                for pm in &s.container.port_mappings {
                    out.push(&pm.target_group_arn);
                }
                for env in &s.container.environment {
                    out.push(&env.value);
                }
                for vol in &s.volumes {
                    out.push(&vol.file_system_id);
                }
            }
            ResourceSpec::DnsRecord(s) => {
                out.push(&s.zone_id);
                out.push(&s.name);
                out.push(&s.record_type);
                out.extend(&s.records);
                for alias in &s.aliases {
                    out.push(&alias.name);
                    out.push(&alias.zone_id);
                }
            }
            ResourceSpec::CertificateValidation(s) => {
                out.push(&s.certificate_arn);
                out.extend(&s.validation_record_fqdns);
            }
            ResourceSpec::Listener(s) => {
                out.push(&s.load_balancer_arn);
                out.push(&s.certificate_arn);
                for action in &s.default_actions {
                    out.push(&action.target_group_arn);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firewall_rule_helpers() {
        let ingress = FirewallRule::tcp_from_anywhere(443);
        assert_eq!(ingress.from_port, 443);
        assert_eq!(ingress.to_port, 443);
        assert_eq!(ingress.protocol, "tcp");
        assert_eq!(ingress.cidr_blocks, vec!["0.0.0.0/0"]);

        let egress = FirewallRule::allow_all_egress();
        assert_eq!(egress.protocol, "-1");
        assert_eq!(egress.from_port, 0);
        assert_eq!(egress.cidr_blocks, vec!["0.0.0.0/0"]);
    }

    #[test]
    fn test_tags_omitted_when_absent() {
        let spec = FileSystemSpec { tags: None };
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_tags_serialized_when_present() {
        let mut tags = Tags::new();
        tags.insert("team".to_string(), "web".to_string());
        let spec = FileSystemSpec { tags: Some(tags) };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["tags"]["team"], "web");
    }
}
