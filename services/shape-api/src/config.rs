//! Service configuration loading and types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use datasource::SourceConfig;
use serde::{Deserialize, Serialize};

/// Service configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The shape source served by this instance.
    pub source: SourceConfig,

    /// Backing document store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Pipeline metric reporting.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Upper bound on a single shape request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Documents held in memory, optionally loaded from a JSON array file.
    Memory {
        #[serde(default)]
        fixtures: Option<PathBuf>,
    },
    /// JSONB documents in PostgreSQL with PostGIS.
    Postgres {
        url: String,
        #[serde(default = "default_table")]
        table: String,
        #[serde(default = "default_srid")]
        srid: i32,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Create the table and index on startup.
        #[serde(default)]
        migrate: bool,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory { fixtures: None }
    }
}

fn default_table() -> String {
    "shapes".to_string()
}

fn default_srid() -> i32 {
    4326
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Component name in reports. Defaults to the source name.
    #[serde(default)]
    pub component: Option<String>,

    /// Report GUID prefix. Defaults to the component name.
    #[serde(default)]
    pub guid_prefix: Option<String>,

    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

fn default_report_interval_secs() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            component: None,
            guid_prefix: None,
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;

        let config: ServiceConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config.validate()?;

        tracing::info!(
            source = %config.source.name,
            key = %config.source.key,
            projection = %config.source.native_crs(),
            "Loaded service config from {:?}",
            path
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .with_context(|| format!("Invalid source '{}'", self.source.name))?;
        anyhow::ensure!(
            self.metrics.report_interval_secs > 0,
            "metrics.report_interval_secs must be positive"
        );
        anyhow::ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );
        Ok(())
    }

    pub fn component(&self) -> &str {
        self.metrics
            .component
            .as_deref()
            .unwrap_or(&self.source.name)
    }

    pub fn guid_prefix(&self) -> &str {
        self.metrics
            .guid_prefix
            .as_deref()
            .unwrap_or_else(|| self.component())
    }
}
