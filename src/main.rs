//! spoolguard daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                  SPOOLGUARD                   │
//!                    │                                               │
//!   config.toml ─────┼─▶ config ──▶ identity table ──▶ registry     │
//!                    │                                    │          │
//!                    │            ┌───────────────────────┤          │
//!                    │            ▼                       ▼          │
//!                    │      probe monitor            admin API ◀────┼──── guard-cli
//!                    │            │                       │          │
//!                    │            ▼                       ▼          │
//!                    │         breakers ──▶ listeners ──▶ audit log  │
//!                    │                                ──▶ broadcast  │
//!                    │                                               │
//!                    │  observability (tracing, metrics)  lifecycle  │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use spoolguard::admin::{self, AdminState};
use spoolguard::breaker::SystemClock;
use spoolguard::config::{load_config, GuardConfig};
use spoolguard::lifecycle::{build_services, signals::shutdown_on_signal, Shutdown};
use spoolguard::observability::{logging, metrics};
use spoolguard::probe::ProbeMonitor;

#[derive(Parser)]
#[command(name = "spoolguard")]
#[command(about = "Circuit breakers for print-management integrations", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; built-in defaults when omitted
    #[arg(short, long, env = "SPOOLGUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "spoolguard starting");
    match &args.config {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
        None => tracing::warn!("No configuration file given, using built-in defaults"),
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let services = build_services(&config, Arc::new(SystemClock::new()))?;
    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.probe.enabled {
        let monitor = ProbeMonitor::new(services.registry.clone(), &config.probe);
        tasks.push(tokio::spawn(monitor.run(shutdown.subscribe())));
    }

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(services.registry.clone(), &config.admin.api_key);
        let rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }));
    }

    tracing::info!(
        breakers = services.registry.len(),
        probe = config.probe.enabled,
        admin = config.admin.enabled,
        "spoolguard running"
    );

    shutdown_on_signal(&shutdown).await;

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Task ended abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
