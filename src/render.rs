//! Plan rendering
//!
//! Two outputs: a human-readable plan in topological creation order (with
//! secrets redacted), and a JSON document carrying the full graph for the
//! provisioning engine to diff and apply.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::graph::ResourceId;
use crate::resources::ResourceSpec;
use crate::stack::{DnsSetup, StackPlan};

/// Version of the exported document layout
const EXPORT_FORMAT_VERSION: u32 = 1;

/// One resource in the exported document.
#[derive(Serialize)]
struct ExportNode<'a> {
    id: usize,
    name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<usize>,
    spec: &'a ResourceSpec,
}

/// The document handed to the provisioning engine. Resources are listed in
/// a valid creation order; secrets are carried verbatim since the engine
/// needs them.
#[derive(Serialize)]
struct ExportDoc<'a> {
    format_version: u32,
    stack: &'a str,
    generated_at: String,
    resources: Vec<ExportNode<'a>>,
    outputs: BTreeMap<&'static str, String>,
}

/// Serialize the plan for the provisioning engine.
pub fn export_json(plan: &StackPlan) -> Result<String> {
    let order = plan.graph.topo_order()?;

    let resources = order
        .iter()
        .map(|&id| {
            let node = plan.graph.node(id);
            ExportNode {
                id: id.index(),
                name: &node.name,
                kind: node.kind().as_str(),
                depends_on: node.depends_on.iter().map(|d| d.index()).collect(),
                spec: &node.spec,
            }
        })
        .collect();

    let mut outputs = BTreeMap::new();
    outputs.insert("url", plan.url().to_engine_string());

    let doc = ExportDoc {
        format_version: EXPORT_FORMAT_VERSION,
        stack: &plan.name,
        generated_at: chrono::Utc::now().to_rfc3339(),
        resources,
        outputs,
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Render the plan for humans: creation order, dependency names, and the
/// resolved URL form. Secret values never appear here.
pub fn render_text(plan: &StackPlan) -> Result<String> {
    let order = plan.graph.topo_order()?;
    let mut out = String::new();

    writeln!(out, "Stack: {}", plan.name)?;
    writeln!(out, "Resources: {}", plan.graph.len())?;
    match &plan.dns {
        DnsSetup::PlainHttp => writeln!(out, "Domain: none (plain HTTP)")?,
        DnsSetup::CustomDomain(chain) => writeln!(out, "Domain: {} (HTTPS)", chain.fqdn)?,
    }
    writeln!(out)?;

    for (step, &id) in order.iter().enumerate() {
        let node = plan.graph.node(id);
        let verb = if node.kind().is_lookup() { "lookup" } else { "create" };
        write!(
            out,
            "{:>3}. {} {:<23} {}",
            step + 1,
            verb,
            node.kind().as_str(),
            node.name
        )?;
        if !node.depends_on.is_empty() {
            let deps = dep_names(plan, &node.depends_on);
            write!(out, "  <- {}", deps.join(", "))?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "url = {}", plan.url())?;
    Ok(out)
}

fn dep_names(plan: &StackPlan, deps: &[ResourceId]) -> Vec<String> {
    deps.iter()
        .map(|&d| plan.graph.node(d).name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawSettings, StackSettings};
    use crate::stack;

    fn plan_with(settings: StackSettings) -> StackPlan {
        stack::build("test", &settings, "aB3dE6gH9jK2mN5p").unwrap()
    }

    #[test]
    fn test_text_render_redacts_password() {
        let plan = plan_with(StackSettings::default());
        let text = render_text(&plan).unwrap();
        assert!(!text.contains("aB3dE6gH9jK2mN5p"));
        assert!(text.contains("url = http://${alb.dns_name}"));
    }

    #[test]
    fn test_export_carries_password_and_every_node_once() {
        let plan = plan_with(StackSettings::default());
        let json = export_json(&plan).unwrap();
        assert!(json.contains("aB3dE6gH9jK2mN5p"));

        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        let resources = doc["resources"].as_array().unwrap();
        assert_eq!(resources.len(), plan.graph.len());

        let mut ids: Vec<u64> = resources
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), plan.graph.len());
    }

    #[test]
    fn test_export_lists_dependencies_before_dependents() {
        let settings = StackSettings::resolve(RawSettings {
            domain: Some("example.com".to_string()),
            subdomain: Some("app".to_string()),
            ..Default::default()
        })
        .unwrap();
        let plan = plan_with(settings);
        let json = export_json(&plan).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

        let mut seen = std::collections::HashSet::new();
        for resource in doc["resources"].as_array().unwrap() {
            for dep in resource["depends_on"]
                .as_array()
                .map(|a| a.as_slice())
                .unwrap_or_default()
            {
                assert!(
                    seen.contains(&dep.as_u64().unwrap()),
                    "dependency listed after dependent"
                );
            }
            seen.insert(resource["id"].as_u64().unwrap());
        }
    }

    #[test]
    fn test_export_url_output() {
        let settings = StackSettings::resolve(RawSettings {
            domain: Some("example.com".to_string()),
            subdomain: Some("app".to_string()),
            ..Default::default()
        })
        .unwrap();
        let plan = plan_with(settings);
        let doc: serde_json::Value =
            serde_json::from_str(&export_json(&plan).unwrap()).unwrap();
        assert_eq!(doc["outputs"]["url"], "https://app.example.com");
    }
}
