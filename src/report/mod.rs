//! Report snapshots of a scan, written to disk as JSON and HTML.
//!
//! Stakes are rounded to `STAKE_DISPLAY_DECIMALS` here and nowhere else, so
//! reported stakes may sum to the budget only within half a cent per outcome.

pub mod html;
pub mod json;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::STAKE_DISPLAY_DECIMALS;
use crate::types::{AnalysisResult, EventAnalysis, MarketKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub total_stake: f64,
    pub arbitrage_opportunities: Vec<EventReport>,
    pub other_opportunities: Vec<EventReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub matchup: String,
    pub commence_time: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,
    pub has_arbitrage: bool,
    pub market_analyses: Vec<MarketReport>,
    pub skipped_markets: Vec<SkippedReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub market_type: MarketKind,
    pub market: String,
    pub opportunities: Vec<OpportunityReport>,
    /// Arbitrage coefficient in percent.
    pub total_implied_prob: f64,
    pub has_arbitrage: bool,
    /// Outcome label → stake, rounded for display. Null without arbitrage.
    pub bet_sizes: Option<BTreeMap<String, f64>>,
    pub guaranteed_payout: Option<f64>,
    /// `"x.xx%"`, or `"0%"` without arbitrage.
    pub potential_profit: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityReport {
    pub outcome: String,
    pub team: String,
    pub point: Option<f64>,
    pub odds: i32,
    pub bookie: String,
    pub bookie_key: String,
    pub decimal_odds: f64,
    pub implied_prob: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedReport {
    pub market: String,
    pub reason: String,
}

impl Report {
    /// Split analyses into arbitrage and other events. Arbitrage events are
    /// ordered by best profit, the rest by lowest coefficient (near misses
    /// first); events without any determinate market are left out.
    pub fn build(analyses: &[EventAnalysis], total_stake: f64, timestamp: DateTime<Utc>) -> Self {
        let mut arbitrage: Vec<&EventAnalysis> = Vec::new();
        let mut other: Vec<&EventAnalysis> = Vec::new();
        for analysis in analyses.iter().filter(|a| !a.results.is_empty()) {
            if analysis.has_arbitrage {
                arbitrage.push(analysis);
            } else {
                other.push(analysis);
            }
        }

        arbitrage.sort_by(|a, b| b.best_profit_pct().total_cmp(&a.best_profit_pct()));
        other.sort_by(|a, b| {
            let a = a.best_coefficient().unwrap_or(f64::INFINITY);
            let b = b.best_coefficient().unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        });

        Self {
            timestamp,
            total_stake,
            arbitrage_opportunities: arbitrage.into_iter().map(EventReport::from_analysis).collect(),
            other_opportunities: other.into_iter().map(EventReport::from_analysis).collect(),
        }
    }
}

impl EventReport {
    pub fn from_analysis(analysis: &EventAnalysis) -> Self {
        Self {
            id: analysis.event_id.clone(),
            sport_key: analysis.sport_key.clone(),
            sport_title: analysis.sport_title.clone(),
            home_team: analysis.home_team.clone(),
            away_team: analysis.away_team.clone(),
            matchup: analysis.matchup(),
            commence_time: analysis.commence_time,
            last_update: analysis.last_update,
            has_arbitrage: analysis.has_arbitrage,
            market_analyses: analysis.results.iter().map(MarketReport::from_result).collect(),
            skipped_markets: analysis
                .skipped
                .iter()
                .map(|s| SkippedReport { market: s.market.clone(), reason: s.reason.to_string() })
                .collect(),
        }
    }
}

impl MarketReport {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let opportunities = result
            .best_quotes
            .iter()
            .map(|best| OpportunityReport {
                outcome: best.quote.outcome.to_string(),
                team: best.quote.outcome.name.clone(),
                point: best.quote.point(),
                odds: best.quote.price,
                bookie: best.quote.bookmaker_title.clone(),
                bookie_key: best.quote.bookmaker_key.clone(),
                decimal_odds: best.decimal_odds,
                implied_prob: best.implied_probability,
            })
            .collect();

        let bet_sizes = result.allocation.as_ref().map(|alloc| {
            alloc
                .stakes
                .iter()
                .map(|s| (s.outcome.to_string(), round_display(s.amount)))
                .collect()
        });

        Self {
            market_type: result.market_kind,
            market: result.market_label.clone(),
            opportunities,
            total_implied_prob: result.total_implied_prob_pct(),
            has_arbitrage: result.has_arbitrage,
            bet_sizes,
            guaranteed_payout: result.allocation.as_ref().map(|a| round_display(a.payout)),
            potential_profit: format_profit(result),
        }
    }
}

pub fn round_display(value: f64) -> f64 {
    let factor = 10f64.powi(STAKE_DISPLAY_DECIMALS as i32);
    (value * factor).round() / factor
}

pub fn format_profit(result: &AnalysisResult) -> String {
    if result.has_arbitrage {
        format!("{:.prec$}%", result.potential_profit_pct, prec = STAKE_DISPLAY_DECIMALS)
    } else {
        "0%".to_string()
    }
}

/// `+150` / `-110`, the way sportsbooks print American odds.
pub fn format_american(price: i32) -> String {
    if price > 0 {
        format!("+{price}")
    } else {
        price.to_string()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::engine::ArbitrageEngine;
    use crate::types::{Event, EventAnalysis, Market, MarketKind, OutcomeKey, Quote};

    fn quote(bookmaker: &str, title: &str, name: &str, price: i32) -> Quote {
        Quote {
            bookmaker_key: bookmaker.to_string(),
            bookmaker_title: title.to_string(),
            outcome: OutcomeKey::named(name),
            price,
            last_update: None,
        }
    }

    /// Event with a moneyline priced at +150 / -125 across two books (arbitrage
    /// when `arb` is true) or -110 / -110 otherwise.
    pub fn analysis(id: &str, home: &str, away: &str, arb: bool) -> EventAnalysis {
        let quotes = if arb {
            vec![
                quote("fanduel", "FanDuel", home, 150),
                quote("draftkings", "DraftKings", away, -125),
            ]
        } else {
            vec![
                quote("fanduel", "FanDuel", home, -110),
                quote("draftkings", "DraftKings", away, -110),
            ]
        };
        let event = Event {
            id: id.to_string(),
            sport_key: "basketball_nba".to_string(),
            sport_title: "NBA".to_string(),
            home_team: Some(home.to_string()),
            away_team: Some(away.to_string()),
            commence_time: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
            markets: vec![Market {
                kind: MarketKind::Moneyline,
                line: None,
                required: vec![OutcomeKey::named(home), OutcomeKey::named(away)],
                quotes,
            }],
        };
        ArbitrageEngine::new(1000.0).analyze_event(&event)
    }
}
