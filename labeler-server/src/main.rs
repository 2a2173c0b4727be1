//! labeler-server - Image labeling service
//!
//! Serves images from a dataset directory one at a time, records true/false
//! labels, appends true labels to a text log, and supports undo.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use labeler_common::config::{CliOverrides, LabelerConfig};
use tokio::signal;
use tracing::info;

use labeler_server::{build_router, logging::init_tracing, AppState};

/// Command-line arguments for labeler-server
#[derive(Parser, Debug)]
#[command(name = "labeler-server")]
#[command(about = "Binary image labeling service")]
#[command(version)]
struct Args {
    /// Directory scanned recursively for images
    #[arg(short, long)]
    dataset_dir: Option<PathBuf>,

    /// Text file receiving one line per image labeled true
    #[arg(short, long)]
    labels_file: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML config file (defaults to <config_dir>/labeler/config.toml)
    #[arg(short, long, env = "LABELER_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            dataset_dir: args.dataset_dir,
            labels_file: args.labels_file,
            host: args.host,
            port: args.port,
            config_file: args.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_filter = init_tracing();

    let cli: CliOverrides = Args::parse().into();
    let config = LabelerConfig::resolve(&cli).context("Failed to load configuration")?;
    log_filter
        .apply_level(&config.log_level)
        .context("Failed to apply configured log level")?;

    info!(
        "Starting Image Labeler (labeler-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    std::fs::create_dir_all(&config.dataset_dir).with_context(|| {
        format!(
            "Failed to create dataset directory {}",
            config.dataset_dir.display()
        )
    })?;
    info!("Dataset directory: {}", config.dataset_dir.display());
    info!("True images file: {}", config.labels_file.display());

    let state = AppState::from_config(&config);
    let count = state.index.refresh();
    info!("Indexed {} images ({})", count, config.extensions.join(", "));

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
