//! Optional DNS/TLS chain for a custom domain
//!
//! Built only when both subdomain and domain are configured; otherwise the
//! stack serves plain HTTP through the load balancer's implicit default
//! listener and none of these resources exist.
//!
//! Creation order is strict: certificate, then the validation DNS record,
//! then the validation wait; the production A-record follows the
//! certificate, and the HTTPS listener follows both the validation and the
//! A-record.

use tracing::info;

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::value::Value;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{
    AliasTarget, CertificateSpec, CertificateValidationSpec, DnsRecordSpec, HostedZoneLookupSpec,
    ListenerAction, ListenerSpec, ResourceSpec,
};

/// TTL of the certificate-validation record, in seconds
const VALIDATION_RECORD_TTL: u32 = 300;

/// How the stack is reached: plain HTTP on the load balancer's generated
/// DNS name, or HTTPS on a custom domain with the full validation chain.
#[derive(Debug)]
pub enum DnsSetup {
    PlainHttp,
    CustomDomain(DnsChain),
}

impl DnsSetup {
    pub fn chain(&self) -> Option<&DnsChain> {
        match self {
            DnsSetup::PlainHttp => None,
            DnsSetup::CustomDomain(chain) => Some(chain),
        }
    }
}

/// Handles to the custom-domain resources.
#[derive(Debug)]
pub struct DnsChain {
    pub fqdn: String,
    pub zone: ResourceId,
    pub certificate: ResourceId,
    pub validation_record: ResourceId,
    pub validation: ResourceId,
    pub alias_record: ResourceId,
    pub https_listener: ResourceId,
}

pub fn declare(
    g: &mut ResourceGraph,
    alb: ResourceId,
    settings: &StackSettings,
) -> Result<DnsSetup, GraphError> {
    let Some((subdomain, domain)) = settings.custom_domain() else {
        return Ok(DnsSetup::PlainHttp);
    };
    let fqdn = format!("{subdomain}.{domain}");
    info!(fqdn = %fqdn, "Declaring custom-domain DNS/TLS chain");

    // Read-only lookup; a missing zone fails the apply outright
    let zone = g.add(
        "zone",
        ResourceSpec::HostedZoneLookup(HostedZoneLookupSpec {
            domain: domain.to_string(),
        }),
        &[],
    )?;

    let certificate = g.add(
        "certificate",
        ResourceSpec::Certificate(CertificateSpec {
            domain_name: fqdn.clone(),
            validation_method: "DNS".to_string(),
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    // A single-name DNS-validated certificate yields exactly one
    // validation option; the index is deliberate and visible in the
    // exported attribute paths.
    let validation_record = g.add(
        "certificate-validation-record",
        ResourceSpec::DnsRecord(DnsRecordSpec {
            zone_id: g.ref_attr(zone, "zone_id"),
            name: g.ref_attr(certificate, "domain_validation_options.0.resource_record_name"),
            record_type: g.ref_attr(certificate, "domain_validation_options.0.resource_record_type"),
            records: vec![
                g.ref_attr(certificate, "domain_validation_options.0.resource_record_value"),
            ],
            ttl: Some(VALIDATION_RECORD_TTL),
            aliases: vec![],
        }),
        &[],
    )?;

    let validation = g.add(
        "certificate-validation",
        ResourceSpec::CertificateValidation(CertificateValidationSpec {
            certificate_arn: g.ref_attr(certificate, "arn"),
            validation_record_fqdns: vec![g.ref_attr(validation_record, "fqdn")],
        }),
        &[],
    )?;

    let alias_record = g.add(
        "alb-alias",
        ResourceSpec::DnsRecord(DnsRecordSpec {
            zone_id: g.ref_attr(zone, "zone_id"),
            name: Value::lit(fqdn.clone()),
            record_type: Value::lit("A"),
            records: vec![],
            ttl: None,
            aliases: vec![AliasTarget {
                name: g.ref_attr(alb, "dns_name"),
                zone_id: g.ref_attr(alb, "zone_id"),
                evaluate_target_health: true,
            }],
        }),
        &[certificate],
    )?;

    let https_listener = g.add(
        "https-listener",
        ResourceSpec::Listener(ListenerSpec {
            load_balancer_arn: g.ref_attr(alb, "arn"),
            port: 443,
            protocol: "HTTPS".to_string(),
            certificate_arn: g.ref_attr(certificate, "arn"),
            default_actions: vec![ListenerAction {
                action_type: "forward".to_string(),
                target_group_arn: g.ref_attr(alb, "default_target_group_arn"),
            }],
            tags: settings.tags.clone(),
        }),
        &[validation, alias_record],
    )?;

    Ok(DnsSetup::CustomDomain(DnsChain {
        fqdn,
        zone,
        certificate,
        validation_record,
        validation,
        alias_record,
        https_listener,
    }))
}
