//! Application state for the shape API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use datasource::{ResponsesSource, ShapeSource};
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline_metrics::{MetricsContext, PipelineReport, PrometheusSink, TracingSink};
use storage::{DocumentStore, MemoryStore, PgDocumentStore};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ServiceConfig, StoreConfig};

/// Shared application state.
pub struct AppState {
    /// The shape source served by this instance.
    pub source: Arc<dyn ShapeSource>,

    /// Store behind the source, used for readiness checks.
    pub store: Arc<dyn DocumentStore>,

    /// Pipeline metrics shared with the source.
    pub metrics: Arc<MetricsContext>,

    /// Most recent pipeline report.
    pub last_report: RwLock<Option<PipelineReport>>,

    /// Prometheus exposition handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,

    /// Upper bound on a single shape request.
    pub request_timeout: Duration,

    /// Root token cancelled on shutdown. Requests use child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        source: Arc<dyn ShapeSource>,
        store: Arc<dyn DocumentStore>,
        metrics: Arc<MetricsContext>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            metrics,
            last_report: RwLock::new(None),
            prometheus: None,
            request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Build the store, metrics context and source described by `config`.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let store = connect_store(&config.store).await?;

        let metrics = Arc::new(
            MetricsContext::new(config.component())
                .with_guid_prefix(config.guid_prefix())
                .with_sink(Arc::new(TracingSink))
                .with_sink(Arc::new(PrometheusSink)),
        );

        let source = ResponsesSource::new(&config.source, Arc::clone(&store), &metrics)
            .with_context(|| format!("Failed to create source '{}'", config.source.name))?;

        info!(
            source = %config.source.name,
            store = store.name(),
            page_size = config.source.page_size,
            "Shape source ready"
        );

        Ok(Self::new(
            Arc::new(source),
            store,
            metrics,
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    /// Take a pipeline report and keep it as the latest one.
    pub async fn report(&self) -> PipelineReport {
        let report = self.metrics.report();
        *self.last_report.write().await = Some(report.clone());
        report
    }
}

async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config {
        StoreConfig::Memory { fixtures: None } => Ok(Arc::new(MemoryStore::default())),
        StoreConfig::Memory {
            fixtures: Some(path),
        } => {
            let store = MemoryStore::from_json_file(path)
                .await
                .with_context(|| format!("Failed to load fixtures from {:?}", path))?;
            Ok(Arc::new(store))
        }
        StoreConfig::Postgres {
            url,
            table,
            srid,
            max_connections,
            migrate,
        } => {
            let store = PgDocumentStore::connect(url, table, *srid, *max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            if *migrate {
                store.migrate().await.context("Failed to migrate schema")?;
            }
            Ok(Arc::new(store))
        }
    }
}
