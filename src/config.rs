//! Configuration resolution
//!
//! Settings come from a TOML file treated as an opaque key-value snapshot,
//! read once before graph construction. Every key has a documented default
//! except `domain`, `subdomain` and `db_password`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::resources::Tags;

/// Default database name
pub const DEFAULT_DB_NAME: &str = "strapi";

/// Default database username
pub const DEFAULT_DB_USERNAME: &str = "strapi";

/// Default database instance class
pub const DEFAULT_DB_INSTANCE_CLASS: &str = "db.t3.micro";

/// Default allocated database storage in GiB
pub const DEFAULT_DB_STORAGE: u32 = 20;

/// Default application container port
pub const DEFAULT_APP_PORT: u16 = 1337;

/// Default CPU reservation (in provider CPU units)
pub const DEFAULT_APP_CPU: u32 = 2048;

/// Default memory reservation in MiB
pub const DEFAULT_APP_MEMORY: u32 = 4096;

/// Default uploads path inside the application source tree
pub const DEFAULT_APP_UPLOADS_PATH: &str = "public/uploads";

/// Container filesystem prefix the application is installed under
pub const APP_ROOT: &str = "/opt/app";

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    Mysql,
    Postgres,
}

impl DbEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            DbEngine::Mysql => "mysql",
            DbEngine::Postgres => "postgres",
        }
    }

    /// Engine-determined database port, used for both the instance and its
    /// security-group ingress rule.
    pub fn port(self) -> u16 {
        match self {
            DbEngine::Mysql => 3306,
            DbEngine::Postgres => 5432,
        }
    }
}

impl std::str::FromStr for DbEngine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(DbEngine::Mysql),
            "postgres" => Ok(DbEngine::Postgres),
            other => Err(ConfigError::UnknownDbEngine(other.to_string())),
        }
    }
}

/// Raw key-value snapshot as found on disk. Unknown keys are tolerated;
/// the configuration source is opaque and may carry settings for other
/// tools.
#[derive(Debug, Default, Deserialize)]
pub struct RawSettings {
    pub db_name: Option<String>,
    pub db_username: Option<String>,
    pub db_type: Option<String>,
    pub db_instance_class: Option<String>,
    pub db_storage: Option<u32>,
    pub db_password: Option<String>,
    pub app_port: Option<u16>,
    pub app_cpu: Option<u32>,
    pub app_memory: Option<u32>,
    pub app_uploads_path: Option<String>,
    pub subdomain: Option<String>,
    pub domain: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
}

/// Fully resolved stack settings.
#[derive(Debug, Clone)]
pub struct StackSettings {
    pub db_name: String,
    pub db_username: String,
    pub db_engine: DbEngine,
    pub db_instance_class: String,
    pub db_storage: u32,
    /// Explicitly configured password; when absent one is generated and
    /// persisted (see `secret`).
    pub db_password: Option<String>,
    pub app_port: u16,
    pub app_cpu: u32,
    pub app_memory: u32,
    pub app_uploads_path: String,
    pub subdomain: Option<String>,
    pub domain: Option<String>,
    pub tags: Option<Tags>,
}

impl StackSettings {
    /// Apply defaults and validate the raw snapshot.
    pub fn resolve(raw: RawSettings) -> Result<Self, ConfigError> {
        let db_engine = match raw.db_type.as_deref() {
            None => DbEngine::Postgres,
            Some(s) => s.parse()?,
        };

        let settings = Self {
            db_name: raw.db_name.unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            db_username: raw
                .db_username
                .unwrap_or_else(|| DEFAULT_DB_USERNAME.to_string()),
            db_engine,
            db_instance_class: raw
                .db_instance_class
                .unwrap_or_else(|| DEFAULT_DB_INSTANCE_CLASS.to_string()),
            db_storage: raw.db_storage.unwrap_or(DEFAULT_DB_STORAGE),
            db_password: raw.db_password.filter(|p| !p.is_empty()),
            app_port: raw.app_port.unwrap_or(DEFAULT_APP_PORT),
            app_cpu: raw.app_cpu.unwrap_or(DEFAULT_APP_CPU),
            app_memory: raw.app_memory.unwrap_or(DEFAULT_APP_MEMORY),
            app_uploads_path: raw
                .app_uploads_path
                .unwrap_or_else(|| DEFAULT_APP_UPLOADS_PATH.to_string()),
            subdomain: raw.subdomain.filter(|s| !s.is_empty()),
            domain: raw.domain.filter(|s| !s.is_empty()),
            tags: raw.tags,
        };

        debug!(
            db_engine = settings.db_engine.as_str(),
            db_port = settings.db_port(),
            app_port = settings.app_port,
            custom_domain = settings.custom_domain().is_some(),
            "Resolved stack settings"
        );

        Ok(settings)
    }

    /// Parse and resolve a TOML snapshot.
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::resolve(raw)
    }

    /// Load settings from a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Engine-derived database port.
    pub fn db_port(&self) -> u16 {
        self.db_engine.port()
    }

    /// The custom-domain pair, present only when both subdomain and domain
    /// are configured. Gates the whole DNS/TLS chain.
    pub fn custom_domain(&self) -> Option<(&str, &str)> {
        match (self.subdomain.as_deref(), self.domain.as_deref()) {
            (Some(sub), Some(dom)) => Some((sub, dom)),
            _ => None,
        }
    }

    /// Fully-qualified name for the custom domain, if configured.
    pub fn fqdn(&self) -> Option<String> {
        self.custom_domain().map(|(sub, dom)| format!("{sub}.{dom}"))
    }

    /// Container path the uploads volume is mounted at.
    pub fn uploads_mount_path(&self) -> String {
        format!("{APP_ROOT}/{}", self.app_uploads_path)
    }
}

impl Default for StackSettings {
    fn default() -> Self {
        Self::resolve(RawSettings::default()).expect("defaults are valid")
    }
}
