use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::ScanLatency;
use crate::config::Config;
use crate::engine::ArbitrageEngine;
use crate::error::Result;
use crate::fetcher::OddsClient;
use crate::ingest::{self, RawEvent};
use crate::report::{html, json, Report};
use crate::snapshot::{self, RawSnapshot};
use crate::state::AnalysisStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub events_fetched: usize,
    pub events_analyzed: usize,
    pub markets_analyzed: usize,
    pub markets_skipped: usize,
    pub arbitrage_events: usize,
    pub arbitrage_markets: usize,
}

/// Fetch → ingest → analyze → publish, once or on an interval.
pub struct Scanner {
    cfg: Config,
    client: OddsClient,
    engine: ArbitrageEngine,
    store: Arc<AnalysisStore>,
    health: Arc<HealthState>,
    latency: Arc<ScanLatency>,
}

impl Scanner {
    pub fn new(
        cfg: Config,
        store: Arc<AnalysisStore>,
        health: Arc<HealthState>,
        latency: Arc<ScanLatency>,
    ) -> Result<Self> {
        let client = OddsClient::new(&cfg)?;
        let engine = ArbitrageEngine::new(cfg.total_stake);
        Ok(Self { cfg, client, engine, store, health, latency })
    }

    /// Rescan every `scan_interval_secs`. A failed scan is logged and the loop
    /// carries on; the store keeps the last good results.
    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.cfg.scan_interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.scan_once().await {
                self.health.record_failure();
                error!("Scan failed: {e}");
            }
        }
    }

    /// Fetch from the provider, save the raw snapshot, then analyze and publish.
    pub async fn scan_once(&self) -> Result<ScanSummary> {
        let started = Instant::now();

        let (raw_events, fetch_stats) = self.client.fetch_all_events().await?;
        self.health.set_quota(fetch_stats.quota);
        info!("[FETCH] {fetch_stats}");
        if fetch_stats.sports_failed > 0 {
            warn!(
                "{} of {} sports failed to fetch this scan",
                fetch_stats.sports_failed, fetch_stats.sports_active,
            );
        }

        let snapshot = RawSnapshot { timestamp: Utc::now(), events: raw_events };
        snapshot::write_snapshot(&self.cfg.raw_snapshot, &snapshot).await?;

        self.publish(snapshot.events, started).await
    }

    /// Re-run ingestion and analysis over the saved raw snapshot. The provider
    /// is not contacted.
    pub async fn analyze_snapshot(&self) -> Result<ScanSummary> {
        let started = Instant::now();

        let snapshot = snapshot::read_snapshot(&self.cfg.raw_snapshot).await?;
        info!(
            "Loaded {} raw events captured at {} from {}",
            snapshot.events.len(),
            snapshot.timestamp,
            self.cfg.raw_snapshot,
        );

        self.publish(snapshot.events, started).await
    }

    /// Ingest → analyze → store → reports → health.
    async fn publish(&self, raw_events: Vec<RawEvent>, started: Instant) -> Result<ScanSummary> {
        let now = Utc::now();
        let (events, ingest_stats) = ingest::build_events(&raw_events, now, self.cfg.upcoming_only);
        info!(
            "[INGEST] {} events in, {} built ({} markets); rejected: started={} no_bookmakers={} no_markets={}",
            ingest_stats.events_in,
            ingest_stats.events_built,
            ingest_stats.markets_built,
            ingest_stats.rejected_started,
            ingest_stats.rejected_no_bookmakers,
            ingest_stats.rejected_no_markets,
        );

        let engine = self.engine;
        let analyses = tokio::task::spawn_blocking(move || engine.analyze_events(&events)).await?;

        let summary = summarize(raw_events.len(), &analyses);
        let scanned_at = Utc::now();
        let report = Report::build(&analyses, self.engine.total_stake(), scanned_at);
        self.store.replace_all(analyses, scanned_at);

        json::write_json(&self.cfg.json_output, &report).await?;
        html::write_html(&self.cfg.html_output, &report).await?;

        let elapsed = started.elapsed();
        self.latency.record(elapsed);
        self.health.record_scan(
            scanned_at.timestamp_millis(),
            self.store.event_count(),
            self.store.arbitrage_count(),
        );

        info!(
            fetched = summary.events_fetched,
            events = summary.events_analyzed,
            markets = summary.markets_analyzed,
            skipped = summary.markets_skipped,
            arbitrage = summary.arbitrage_markets,
            duration_ms = elapsed.as_millis() as u64,
            quota_remaining = ?self.health.quota().remaining,
            "Scan complete: {} arbitrage markets across {} events ({} analyzed), reports at {} / {}",
            summary.arbitrage_markets,
            summary.arbitrage_events,
            summary.events_analyzed,
            self.cfg.json_output,
            self.cfg.html_output,
        );
        log_opportunities(&report);

        Ok(summary)
    }
}

fn summarize(events_fetched: usize, analyses: &[crate::types::EventAnalysis]) -> ScanSummary {
    let mut summary = ScanSummary {
        events_fetched,
        events_analyzed: analyses.len(),
        markets_analyzed: 0,
        markets_skipped: 0,
        arbitrage_events: 0,
        arbitrage_markets: 0,
    };
    for analysis in analyses {
        summary.markets_analyzed += analysis.results.len();
        summary.markets_skipped += analysis.skipped.len();
        summary.arbitrage_markets += analysis.results.iter().filter(|r| r.has_arbitrage).count();
        if analysis.has_arbitrage {
            summary.arbitrage_events += 1;
        }
    }
    summary
}

fn log_opportunities(report: &Report) {
    for event in &report.arbitrage_opportunities {
        for market in event.market_analyses.iter().filter(|m| m.has_arbitrage) {
            info!(
                event = "ARBITRAGE",
                event_id = %event.id,
                market = %market.market,
                coefficient = market.total_implied_prob,
                "ARB | {} | {} | {} | coefficient {:.2}% | profit {}",
                event.sport_title,
                event.matchup,
                market.market,
                market.total_implied_prob,
                market.potential_profit,
            );
        }
    }
}
