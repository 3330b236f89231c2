use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry of `GET /sports`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawSport {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

impl RawSport {
    /// Futures-style sports (e.g. `golf_masters_tournament_winner`) only carry
    /// outright markets.
    pub fn is_outright(&self) -> bool {
        self.key.contains("winner") || self.has_outrights
    }
}

/// Entry of `GET /sports/{sport}/odds`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawEvent {
    pub id: String,
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: Option<String>,
    pub commence_time: DateTime<Utc>,
    /// Absent on outright events.
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<RawBookmaker>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawBookmaker {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<RawMarket>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<RawOutcome>,
}

/// Prices arrive as JSON numbers; integrality is checked at ingestion.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawOutcome {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}
