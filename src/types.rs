use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Point lines
// ---------------------------------------------------------------------------

/// Spread or totals line stored in hundredths: `(point * 100).round() as i32`.
/// Keeps outcome keys hashable and ordered without floating-point comparisons
/// while covering quarter lines (e.g. -0.25 asian handicaps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Line(i32);

impl Line {
    const SCALE: f64 = 100.0;

    /// None for NaN/infinite points or lines outside the i32 range.
    pub fn from_point(point: f64) -> Option<Self> {
        let scaled = (point * Self::SCALE).round();
        if !scaled.is_finite() || scaled < f64::from(i32::MIN) || scaled > f64::from(i32::MAX) {
            return None;
        }
        Some(Self(scaled as i32))
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / Self::SCALE
    }

    /// The opposing side of a spread: home -3.5 is away +3.5.
    pub fn opposite(self) -> Self {
        Self(-self.0)
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}", self.0 / 100)
        } else if self.0 % 10 == 0 {
            write!(f, "{:.1}", self.value())
        } else {
            write!(f, "{:.2}", self.value())
        }
    }
}

impl Serialize for Line {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

// ---------------------------------------------------------------------------
// Outcomes, quotes, markets, events
// ---------------------------------------------------------------------------

/// A specific selection within a market. Spread and totals outcomes carry their
/// line: "Lakers -3.5" and "Lakers -4.5" are different outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OutcomeKey {
    pub name: String,
    pub line: Option<Line>,
}

impl OutcomeKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), line: None }
    }

    pub fn with_line(name: impl Into<String>, line: Line) -> Self {
        Self { name: name.into(), line: Some(line) }
    }
}

impl std::fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} ({line})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarketKind {
    #[serde(rename = "h2h")]
    Moneyline,
    #[serde(rename = "spreads")]
    Spread,
    #[serde(rename = "totals")]
    Totals,
    #[serde(rename = "outrights")]
    Outright,
}

impl MarketKind {
    /// Market key as used by the odds provider.
    pub fn api_key(self) -> &'static str {
        match self {
            MarketKind::Moneyline => "h2h",
            MarketKind::Spread => "spreads",
            MarketKind::Totals => "totals",
            MarketKind::Outright => "outrights",
        }
    }

    pub fn from_api_key(key: &str) -> Option<Self> {
        match key {
            "h2h" => Some(MarketKind::Moneyline),
            "spreads" => Some(MarketKind::Spread),
            "totals" => Some(MarketKind::Totals),
            "outrights" => Some(MarketKind::Outright),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_key())
    }
}

/// One bookmaker's price for one outcome. `price` is American odds as supplied;
/// validity (nonzero, |price| >= 100) is enforced by the engine, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub bookmaker_key: String,
    pub bookmaker_title: String,
    pub outcome: OutcomeKey,
    pub price: i32,
    pub last_update: Option<DateTime<Utc>>,
}

impl Quote {
    pub fn point(&self) -> Option<f64> {
        self.outcome.line.map(Line::value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Market {
    pub kind: MarketKind,
    /// Line that identifies this market among its siblings: the home team's
    /// spread, or the totals number. None for moneyline and outrights.
    pub line: Option<Line>,
    /// Every outcome that must be quoted before the market can be judged.
    pub required: Vec<OutcomeKey>,
    pub quotes: Vec<Quote>,
}

impl Market {
    pub fn label(&self) -> String {
        match self.line {
            Some(line) => format!("{} ({line})", self.kind),
            None => self.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub commence_time: DateTime<Utc>,
    pub markets: Vec<Market>,
}

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// The winning quote for one outcome with its normalized odds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedQuote {
    pub quote: Quote,
    pub decimal_odds: f64,
    pub implied_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stake {
    pub outcome: OutcomeKey,
    pub bookmaker_key: String,
    pub amount: f64,
}

/// Unrounded stake split. `amount * decimal_odds == payout` for every stake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeAllocation {
    pub total_stake: f64,
    /// Return on any outcome: `total_stake / total_implied_probability`.
    pub payout: f64,
    pub profit: f64,
    pub stakes: Vec<Stake>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub market_kind: MarketKind,
    pub market_line: Option<Line>,
    pub market_label: String,
    pub best_quotes: Vec<PricedQuote>,
    /// Sum of implied probabilities of the best quotes, as a fraction.
    pub total_implied_probability: f64,
    pub has_arbitrage: bool,
    pub potential_profit_pct: f64,
    pub allocation: Option<StakeAllocation>,
}

impl AnalysisResult {
    /// Arbitrage coefficient: total implied probability on the percent scale.
    pub fn total_implied_prob_pct(&self) -> f64 {
        self.total_implied_probability * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedMarket {
    pub market: String,
    pub reason: AnalysisError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalysis {
    pub event_id: String,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub commence_time: DateTime<Utc>,
    /// Most recent bookmaker update across all quotes of the event.
    pub last_update: Option<DateTime<Utc>>,
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedMarket>,
    pub has_arbitrage: bool,
}

impl EventAnalysis {
    /// Lowest arbitrage coefficient (percent) across the event's markets.
    pub fn best_coefficient(&self) -> Option<f64> {
        self.results
            .iter()
            .map(AnalysisResult::total_implied_prob_pct)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn best_profit_pct(&self) -> f64 {
        self.results
            .iter()
            .map(|r| r.potential_profit_pct)
            .fold(0.0, f64::max)
    }

    pub fn matchup(&self) -> String {
        match (&self.home_team, &self.away_team) {
            (Some(home), Some(away)) => format!("{home} vs {away}"),
            _ => self.sport_title.clone(),
        }
    }
}
