//! strapi-stack - Declarative AWS resource graph for a containerized
//! Strapi deployment
//!
//! This crate builds the desired-state plan (network, security groups,
//! registry and image, database, shared storage, load-balanced compute,
//! and an optional custom-domain TLS chain) and renders it for an external
//! provisioning engine. It performs no cloud API calls itself: diffing,
//! ordering execution, retries, and attribute resolution all belong to the
//! engine consuming the exported document.
//!
//! ## Modules
//!
//! - [`config`]: settings resolution with documented defaults
//! - [`secret`]: generated database password, persisted per stack
//! - [`state`]: local SQLite state database
//! - [`graph`]: resource dependency graph and engine-resolved values
//! - [`resources`]: typed resource specifications
//! - [`stack`]: composition of the full plan
//! - [`render`]: text plan and JSON export

pub mod config;
pub mod error;
pub mod graph;
pub mod render;
pub mod resources;
pub mod secret;
pub mod stack;
pub mod state;

// Re-export commonly used types
pub use config::{DbEngine, StackSettings};
pub use error::{ConfigError, GraphError};
pub use graph::value::Value;
pub use graph::{ResourceGraph, ResourceId};
pub use stack::{DnsSetup, StackPlan};
