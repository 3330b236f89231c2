use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::report::Report;
use crate::types::EventAnalysis;

// ---------------------------------------------------------------------------
// AnalysisStore
// ---------------------------------------------------------------------------

/// Latest analysis per event. The scanner replaces the contents after every
/// scan; the API reads concurrently.
pub struct AnalysisStore {
    /// event_id → analysis from the most recent scan
    events: DashMap<String, EventAnalysis>,
    /// Completion time of the scan that produced `events` (None before the first scan).
    scanned_at: RwLock<Option<DateTime<Utc>>>,
}

impl AnalysisStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Swap in a fresh scan. Events missing from `analyses` are dropped so the
    /// store never serves odds from a previous scan.
    pub fn replace_all(&self, analyses: Vec<EventAnalysis>, scanned_at: DateTime<Utc>) {
        let fresh_ids: HashSet<String> = analyses.iter().map(|a| a.event_id.clone()).collect();
        for analysis in analyses {
            self.events.insert(analysis.event_id.clone(), analysis);
        }
        self.events.retain(|id, _| fresh_ids.contains(id));

        if let Ok(mut guard) = self.scanned_at.write() {
            *guard = Some(scanned_at);
        }
    }

    pub fn get(&self, event_id: &str) -> Option<EventAnalysis> {
        self.events.get(event_id).map(|e| e.clone())
    }

    pub fn all(&self) -> Vec<EventAnalysis> {
        self.events.iter().map(|e| e.value().clone()).collect()
    }

    /// Events with at least one arbitrage market, best profit first.
    pub fn arbitrage(&self) -> Vec<EventAnalysis> {
        let mut found: Vec<EventAnalysis> = self
            .events
            .iter()
            .filter(|e| e.has_arbitrage)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.best_profit_pct().total_cmp(&a.best_profit_pct()));
        found
    }

    /// Filtered view sorted by lowest arbitrage coefficient. Events without a
    /// determinate market sort last.
    pub fn query(&self, sport: Option<&str>, min_profit: Option<f64>, limit: Option<usize>) -> Vec<EventAnalysis> {
        let mut found: Vec<EventAnalysis> = self
            .events
            .iter()
            .filter(|e| sport.map_or(true, |s| e.sport_key == s))
            .filter(|e| min_profit.map_or(true, |p| e.has_arbitrage && e.best_profit_pct() >= p))
            .map(|e| e.value().clone())
            .collect();

        found.sort_by(|a, b| {
            let a_coef = a.best_coefficient().unwrap_or(f64::INFINITY);
            let b_coef = b.best_coefficient().unwrap_or(f64::INFINITY);
            a_coef.total_cmp(&b_coef).then_with(|| a.event_id.cmp(&b.event_id))
        });
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        found
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn arbitrage_count(&self) -> usize {
        self.events.iter().filter(|e| e.has_arbitrage).count()
    }

    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.scanned_at.read().ok().and_then(|g| *g)
    }

    /// Report over the current contents, stamped with the last scan time.
    /// None before the first scan completes.
    pub fn snapshot(&self, total_stake: f64) -> Option<Report> {
        let scanned_at = self.scanned_at()?;
        Some(Report::build(&self.all(), total_stake, scanned_at))
    }
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self {
            events: DashMap::new(),
            scanned_at: RwLock::new(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
