//! Shape API Server
//!
//! Serves survey shapes as GeoJSON by bounding box or XYZ tile.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use shape_api::config::ServiceConfig;
use shape_api::reporter::run_reporter;
use shape_api::router::build_router;
use shape_api::state::AppState;

/// Shape API Server
#[derive(Parser, Debug)]
#[command(name = "shape-api")]
#[command(about = "GeoJSON shape server over a survey document store")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8085", env = "SHAPE_API_LISTEN_ADDR")]
    listen: String,

    /// Service configuration file (YAML)
    #[arg(short, long, default_value = "config/shape-api.yaml", env = "SHAPE_API_CONFIG")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "SHAPE_API_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting shape API server");

    let config = ServiceConfig::load(&args.config)?;
    let shutdown = CancellationToken::new();

    let state = Arc::new(
        AppState::from_config(&config)
            .await?
            .with_prometheus(prometheus_handle)
            .with_shutdown(shutdown.clone()),
    );

    let reporter = tokio::spawn(run_reporter(
        Arc::clone(&state),
        Duration::from_secs(config.metrics.report_interval_secs),
        shutdown.clone(),
    ));

    let app = build_router(Arc::clone(&state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Shape API listening on {}", addr);

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
            signal_token.cancel();
        })
        .await
        .context("Server failed")?;

    shutdown.cancel();
    if let Err(e) = reporter.await {
        error!(error = %e, "Pipeline reporter task failed");
    }

    info!("Shape API stopped");
    Ok(())
}
