//! Typed errors for configuration resolution and graph construction
//!
//! Provider-side failures (quota, permissions, invalid parameters) are the
//! provisioning engine's to surface; nothing here wraps them.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration resolution errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unrecognized database engine in the configuration file
    #[error("unknown database engine '{0}' (expected \"mysql\" or \"postgres\")")]
    UnknownDbEngine(String),

    /// Configuration file could not be read
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("invalid configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Resource graph construction errors
///
/// All of these are programming or input errors caught before anything is
/// handed to the provisioning engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two resources registered under the same name
    #[error("duplicate resource name '{0}'")]
    DuplicateName(String),

    /// A dependency edge points at a resource the graph does not contain
    #[error("resource '{name}' depends on unknown resource id {id}")]
    UnknownDependency { name: String, id: usize },

    /// The dependency edges contain a cycle
    #[error("dependency cycle involving resource '{0}'")]
    DependencyCycle(String),
}
