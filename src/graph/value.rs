//! Attribute values resolved by the provisioning engine
//!
//! Remote attributes (an RDS address, an ALB DNS name) only exist after the
//! engine creates the resource, so specs hold a [`Value`] that is either a
//! literal known at build time or a reference the engine resolves later.
//! Every reference inside a spec becomes an ordering edge in the graph.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::graph::ResourceId;

/// A string-valued attribute in a resource specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Literal known at graph-construction time
    Lit(String),
    /// Literal that must never appear in human-readable output
    Secret(String),
    /// Attribute of another resource, resolved by the engine after creation
    Ref {
        resource: ResourceId,
        /// Name of the referenced resource (for rendering)
        target: String,
        /// Attribute path on the target, e.g. `"address"` or
        /// `"domain_validation_options.0.resource_record_name"`
        attr: String,
    },
    /// Concatenation of parts, e.g. `http://` + an ALB DNS name
    Concat(Vec<Value>),
}

impl Value {
    pub fn lit(s: impl Into<String>) -> Self {
        Value::Lit(s.into())
    }

    pub fn secret(s: impl Into<String>) -> Self {
        Value::Secret(s.into())
    }

    /// Collect every resource this value references, recursively.
    pub fn refs(&self) -> Vec<ResourceId> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<ResourceId>) {
        match self {
            Value::Lit(_) | Value::Secret(_) => {}
            Value::Ref { resource, .. } => out.push(*resource),
            Value::Concat(parts) => {
                for part in parts {
                    part.collect_refs(out);
                }
            }
        }
    }

    /// Render for the engine document: references become `${target.attr}`
    /// placeholders the engine interpolates after resolution; secrets are
    /// carried verbatim (the engine needs them).
    pub fn to_engine_string(&self) -> String {
        match self {
            Value::Lit(s) | Value::Secret(s) => s.clone(),
            Value::Ref { target, attr, .. } => format!("${{{target}.{attr}}}"),
            Value::Concat(parts) => parts.iter().map(Value::to_engine_string).collect(),
        }
    }
}

/// Human-readable rendering: same as the engine form, except secrets are
/// redacted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Lit(s) => f.write_str(s),
            Value::Secret(_) => f.write_str("[secret]"),
            Value::Ref { target, attr, .. } => write!(f, "${{{target}.{attr}}}"),
            Value::Concat(parts) => {
                for part in parts {
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_engine_string())
    }
}
