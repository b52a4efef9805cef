//! Park admission daemon
//!
//! Hosts the admission-control core for a park: loads the attraction and
//! visitor configuration once at startup, serves Prometheus metrics, logs a
//! periodic summary, and re-applies the configuration on SIGHUP.
//!
//! Module structure:
//! - `domain/` - Core types (attraction state, statuses, rankings, errors)
//! - `services/` - Admission, incidents, scoring, ranking, park facade
//! - `io/` - External collaborators (visitor directory, Prometheus)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use park_admission::infra::config::DEFAULT_CONFIG_PATH;
use park_admission::infra::{Config, Metrics};
use park_admission::io::StaticDirectory;
use park_admission::services::Park;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Park admission - attraction capacity and leaderboard core
#[derive(Parser, Debug)]
#[command(name = "park-admission", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug shows every admission decision
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("park-admission starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site_id = %config.site_id(),
        attractions = %config.attractions().len(),
        visitors = %config.visitors().len(),
        prometheus_port = %config.prometheus_port(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
    let metrics = Arc::new(Metrics::new());
    let park = Arc::new(Park::new(&config, directory.clone(), metrics.clone())?);

    // Prometheus metrics HTTP server (if port > 0)
    let prometheus_port = config.prometheus_port();
    if prometheus_port > 0 {
        let prom_park = park.clone();
        let prom_site = config.site_id().to_string();
        let prom_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = park_admission::io::prometheus::start_metrics_server(
                prometheus_port,
                prom_park,
                prom_site,
                prom_shutdown,
            )
            .await
            {
                tracing::error!(error = %e, "Prometheus metrics server error");
            }
        });
    }

    // Periodic summary log
    let report_metrics = metrics.clone();
    let report_park = park.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            report_metrics.report().log();
            for status in report_park.statuses() {
                info!(
                    attraction_id = %status.attraction_id,
                    occupancy = %status.occupancy,
                    max_capacity = %status.max_capacity,
                    status = %status.status,
                    "attraction_status"
                );
            }
        }
    });

    #[cfg(unix)]
    {
        let reload_park = park.clone();
        let reload_directory = directory.clone();
        let reload_path = args.config.clone();
        tokio::spawn(async move {
            reload_on_sighup(reload_path, reload_park, reload_directory).await;
        });
    }

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    metrics.report().log();
    info!("park-admission shutdown complete");
    Ok(())
}

/// Re-read the config file and apply attractions and visitors on SIGHUP
#[cfg(unix)]
async fn reload_on_sighup(path: String, park: Arc<Park>, directory: Arc<StaticDirectory>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "sighup_handler_failed");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!(config_file = %path, "config_reload_requested");
        match Config::from_file(&path) {
            Ok(config) => {
                if park.apply_attractions(config.attractions()).is_ok() {
                    directory.replace(config.visitors());
                    info!(visitors = %directory.len(), "config_reloaded");
                }
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "config_reload_failed");
            }
        }
    }
}
