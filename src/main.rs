mod api;
mod config;
mod engine;
mod error;
mod fetcher;
mod ingest;
mod report;
mod scanner;
mod snapshot;
mod state;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::ScanLatency;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, ScanMode};
use crate::error::Result;
use crate::scanner::Scanner;
use crate::state::AnalysisStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let store = AnalysisStore::new();
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(ScanLatency::new());

    info!(
        "Scanner starting: mode={:?} regions={} stake=${:.2} upcoming_only={} interval={}s",
        cfg.mode, cfg.regions, cfg.total_stake, cfg.upcoming_only, cfg.scan_interval_secs,
    );

    let scanner = Scanner::new(
        cfg.clone(),
        Arc::clone(&store),
        Arc::clone(&health),
        Arc::clone(&latency),
    )?;

    // --- Single pass: write reports and exit ---
    if !cfg.is_continuous() {
        let summary = match cfg.mode {
            ScanMode::Fetch => scanner.scan_once().await?,
            ScanMode::Analyze => scanner.analyze_snapshot().await?,
        };
        info!(
            "Found {} arbitrage opportunities in {} events",
            summary.arbitrage_markets, summary.events_analyzed,
        );
        return Ok(());
    }

    // --- Continuous: rescan in the background, serve the latest results ---
    tokio::spawn(async move { scanner.run().await });

    let api_state = ApiState {
        store,
        health,
        latency,
        total_stake: cfg.total_stake,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
