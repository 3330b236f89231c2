use std::time::Duration;

use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Config, GAME_MARKETS, HTTP_TIMEOUT_SECS, OUTRIGHT_MARKETS};
use crate::error::{AppError, Result};
use crate::ingest::{RawEvent, RawSport};

/// Request quota reported by the provider on every response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: Option<u64>,
    pub used: Option<u64>,
}

#[derive(Debug, Default)]
pub struct FetchStats {
    pub sports_total: usize,
    pub sports_active: usize,
    /// Sports that answered 404 (no current odds).
    pub sports_without_odds: usize,
    pub sports_failed: usize,
    pub events_total: usize,
    pub events_unparseable: usize,
    pub quota: Quota,
}

impl fmt::Display for FetchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sports: {} listed, {} active, {} without odds, {} failed; events: {} received, {} unparseable",
            self.sports_total,
            self.sports_active,
            self.sports_without_odds,
            self.sports_failed,
            self.events_total,
            self.events_unparseable,
        )
    }
}

/// Thin client over the odds provider's REST API.
pub struct OddsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    regions: String,
    request_delay: Duration,
}

impl OddsClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.odds_api_url.clone(),
            api_key: cfg.api_key.clone(),
            regions: cfg.regions.clone(),
            request_delay: Duration::from_millis(cfg.request_delay_ms),
        })
    }

    /// `GET /sports`. Any non-success status fails the whole scan.
    pub async fn fetch_sports(&self) -> Result<(Vec<RawSport>, Quota)> {
        let url = sports_url(&self.base_url, &self.api_key);
        let resp = self.http.get(&url).send().await?;
        let quota = parse_quota(resp.headers());

        if !resp.status().is_success() {
            return Err(AppError::ApiStatus {
                status: resp.status().as_u16(),
                endpoint: "sports".to_string(),
            });
        }

        let sports: Vec<RawSport> = resp.json().await?;
        Ok((sports, quota))
    }

    /// `GET /sports/{key}/odds`. A 404 means the sport has no current odds and
    /// yields `Ok(None)`.
    pub async fn fetch_sport_odds(
        &self,
        sport: &RawSport,
    ) -> Result<(Option<Vec<serde_json::Value>>, Quota)> {
        let url = odds_url(&self.base_url, &self.api_key, &self.regions, sport);
        let resp = self.http.get(&url).send().await?;
        let quota = parse_quota(resp.headers());

        match resp.status() {
            StatusCode::NOT_FOUND => Ok((None, quota)),
            status if status.is_success() => {
                let items: Vec<serde_json::Value> = resp.json().await?;
                Ok((Some(items), quota))
            }
            status => Err(AppError::ApiStatus {
                status: status.as_u16(),
                endpoint: format!("odds/{}", sport.key),
            }),
        }
    }

    /// Fetch odds for every active sport, one request at a time with
    /// `request_delay` between requests. Per-sport failures are logged and
    /// skipped; only the sports list itself is fatal.
    pub async fn fetch_all_events(&self) -> Result<(Vec<RawEvent>, FetchStats)> {
        let (sports, quota) = self.fetch_sports().await?;
        let mut stats = FetchStats { sports_total: sports.len(), quota, ..Default::default() };

        let active: Vec<&RawSport> = sports.iter().filter(|s| s.active).collect();
        stats.sports_active = active.len();
        info!("Found {} active sports ({} listed)", active.len(), sports.len());

        let mut events = Vec::new();
        for sport in active {
            match self.fetch_sport_odds(sport).await {
                Ok((Some(items), quota)) => {
                    stats.quota = merge_quota(stats.quota, quota);
                    let (parsed, rejected) = parse_events(&items);
                    stats.events_total += items.len();
                    stats.events_unparseable += rejected;
                    debug!(sport = %sport.key, events = parsed.len(), rejected, "odds fetched");
                    events.extend(parsed);
                }
                Ok((None, quota)) => {
                    stats.quota = merge_quota(stats.quota, quota);
                    stats.sports_without_odds += 1;
                }
                Err(e) => {
                    stats.sports_failed += 1;
                    warn!("Failed to fetch odds for {}: {e}", sport.title);
                }
            }

            tokio::time::sleep(self.request_delay).await;
        }

        Ok((events, stats))
    }
}

pub fn sports_url(base_url: &str, api_key: &str) -> String {
    format!("{base_url}/sports/?apiKey={api_key}")
}

pub fn odds_url(base_url: &str, api_key: &str, regions: &str, sport: &RawSport) -> String {
    format!(
        "{}/sports/{}/odds/?apiKey={}&regions={}&markets={}&oddsFormat=american&dateFormat=iso",
        base_url,
        sport.key,
        api_key,
        regions,
        markets_for(sport),
    )
}

pub fn markets_for(sport: &RawSport) -> &'static str {
    if sport.is_outright() {
        OUTRIGHT_MARKETS
    } else {
        GAME_MARKETS
    }
}

/// Deserialize events one by one so a single malformed event does not discard
/// the rest of the sport. Returns the parsed events and the rejection count.
pub fn parse_events(items: &[serde_json::Value]) -> (Vec<RawEvent>, usize) {
    let mut events = Vec::with_capacity(items.len());
    let mut rejected = 0;
    for item in items {
        match RawEvent::deserialize(item) {
            Ok(event) => events.push(event),
            Err(e) => {
                rejected += 1;
                debug!("unparseable event skipped: {e}");
            }
        }
    }
    (events, rejected)
}

fn parse_quota(headers: &HeaderMap) -> Quota {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    };
    Quota {
        remaining: read("x-requests-remaining"),
        used: read("x-requests-used"),
    }
}

/// The latest response wins, but a response without headers does not erase
/// what an earlier one reported.
fn merge_quota(previous: Quota, latest: Quota) -> Quota {
    Quota {
        remaining: latest.remaining.or(previous.remaining),
        used: latest.used.or(previous.used),
    }
}
