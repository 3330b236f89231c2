//! Arbitrage detection and stake allocation.
//!
//! Pure, synchronous pipeline: normalize prices, select the best quote per
//! outcome, classify the market, split the stake. Nothing here performs I/O or
//! keeps state between calls, so distinct events can be analyzed on any thread
//! in any order.

pub mod allocator;
pub mod classifier;
pub mod price;
pub mod selector;

use tracing::debug;

use crate::error::AnalysisError;
use crate::types::{AnalysisResult, Event, EventAnalysis, Market, SkippedMarket};

use self::allocator::allocate;
use self::classifier::classify;
use self::selector::select_best;

/// Carries the stake budget `S`; the only knob the engine has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrageEngine {
    total_stake: f64,
}

impl ArbitrageEngine {
    pub fn new(total_stake: f64) -> Self {
        Self { total_stake }
    }

    pub fn total_stake(&self) -> f64 {
        self.total_stake
    }

    /// Analyze one market. An `Err` means the market is indeterminate and must
    /// be skipped, never read as "no arbitrage".
    pub fn analyze_market(&self, market: &Market) -> Result<AnalysisResult, AnalysisError> {
        if market.quotes.is_empty() || market.required.is_empty() {
            return Err(AnalysisError::EmptyMarket);
        }

        let selections = select_best(&market.required, &market.quotes);
        let classification = classify(&selections)?;
        let best_quotes: Vec<_> = selections.into_iter().filter_map(|s| s.best).collect();

        let allocation = if classification.has_arbitrage {
            allocate(
                &best_quotes,
                classification.total_implied_probability,
                self.total_stake,
            )
        } else {
            None
        };

        Ok(AnalysisResult {
            market_kind: market.kind,
            market_line: market.line,
            market_label: market.label(),
            best_quotes,
            total_implied_probability: classification.total_implied_probability,
            has_arbitrage: classification.has_arbitrage,
            potential_profit_pct: classification.potential_profit_pct,
            allocation,
        })
    }

    /// Analyze every market of an event. Indeterminate markets land in
    /// `skipped` with their reason; the rest of the event is unaffected.
    pub fn analyze_event(&self, event: &Event) -> EventAnalysis {
        let (results, skipped) = event.markets.iter().fold(
            (Vec::new(), Vec::new()),
            |(mut results, mut skipped), market| {
                match self.analyze_market(market) {
                    Ok(result) => results.push(result),
                    Err(reason) => {
                        debug!(
                            event_id = %event.id,
                            market = %market.label(),
                            "market skipped: {reason}"
                        );
                        skipped.push(SkippedMarket { market: market.label(), reason });
                    }
                }
                (results, skipped)
            },
        );

        let last_update = event
            .markets
            .iter()
            .flat_map(|m| m.quotes.iter())
            .filter_map(|q| q.last_update)
            .max();

        EventAnalysis {
            event_id: event.id.clone(),
            sport_key: event.sport_key.clone(),
            sport_title: event.sport_title.clone(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            commence_time: event.commence_time,
            last_update,
            has_arbitrage: results.iter().any(|r: &AnalysisResult| r.has_arbitrage),
            results,
            skipped,
        }
    }

    pub fn analyze_events(&self, events: &[Event]) -> Vec<EventAnalysis> {
        events.iter().map(|e| self.analyze_event(e)).collect()
    }
}
