//! FeedGuard Server
//!
//! HTTP front end for post moderation, prompt gating, image thresholding
//! and topic tagging.

use anyhow::Result;
use clap::Parser;
use feedguard_core::Settings;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

mod routes;
mod state;

#[derive(Parser, Debug)]
#[command(name = "feedguard-server")]
#[command(about = "FeedGuard moderation and topic tagging service", long_about = None)]
struct Cli {
    /// Optional YAML settings file; environment variables take precedence
    #[arg(short, long, env = "FEEDGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long, env = "FEEDGUARD_LISTEN", default_value = "0.0.0.0")]
    listen: String,

    /// Listen port
    #[arg(short = 'P', long, env = "FEEDGUARD_PORT", default_value = "8000")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    info!("Starting FeedGuard server");

    let settings = Settings::load(cli.config.as_deref())?;
    info!(
        moderation_model = %settings.moderation_model,
        embedding_model = %settings.tagger_emb_model,
        remote = %settings.remote_base_url,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;

    let state = state::AppState::new(settings, metrics_handle)?;
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("feedguard=debug,tower=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "feedguard_moderation_total",
        "Post moderation verdicts by decision path"
    );
    metrics::describe_counter!(
        "feedguard_moderation_retries_total",
        "Failed remote model attempts"
    );
    metrics::describe_counter!(
        "feedguard_hard_override_total",
        "Verdicts forced unsafe by the minor-safety rule"
    );
    metrics::describe_counter!(
        "feedguard_topic_tagging_total",
        "Topic tagging calls by outcome"
    );
    metrics::describe_histogram!(
        "feedguard_request_latency_us",
        metrics::Unit::Microseconds,
        "Request handling latency in microseconds by route"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
