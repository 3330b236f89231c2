//! Boundary between raw provider payloads and the engine's typed records.
//!
//! Everything downstream of `build_events` sees immutable `Event`s whose
//! markets carry their full set of required outcomes.

pub mod messages;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{Event, Line, Market, MarketKind, OutcomeKey, Quote};

pub use self::messages::{RawBookmaker, RawEvent, RawOutcome, RawSport};

pub const DRAW: &str = "Draw";
pub const OVER: &str = "Over";
pub const UNDER: &str = "Under";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestStats {
    pub events_in: usize,
    pub events_built: usize,
    pub rejected_started: usize,
    pub rejected_no_bookmakers: usize,
    pub rejected_no_markets: usize,
    pub markets_built: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Commence time is not in the future (live or finished event).
    Started,
    NoBookmakers,
    NoMarkets,
}

/// Validate raw events into typed `Event`s, dropping the ones that cannot be
/// analyzed.
pub fn build_events(
    raw: &[RawEvent],
    now: DateTime<Utc>,
    upcoming_only: bool,
) -> (Vec<Event>, IngestStats) {
    let mut stats = IngestStats { events_in: raw.len(), ..Default::default() };
    let mut events = Vec::with_capacity(raw.len());

    for item in raw {
        match build_event(item, now, upcoming_only) {
            Ok(event) => {
                stats.markets_built += event.markets.len();
                events.push(event);
            }
            Err(rejection) => {
                debug!(event_id = %item.id, ?rejection, "event rejected at ingestion");
                match rejection {
                    Rejection::Started => stats.rejected_started += 1,
                    Rejection::NoBookmakers => stats.rejected_no_bookmakers += 1,
                    Rejection::NoMarkets => stats.rejected_no_markets += 1,
                }
            }
        }
    }

    stats.events_built = events.len();
    (events, stats)
}

pub fn build_event(
    raw: &RawEvent,
    now: DateTime<Utc>,
    upcoming_only: bool,
) -> Result<Event, Rejection> {
    if upcoming_only && raw.commence_time <= now {
        return Err(Rejection::Started);
    }
    if raw.bookmakers.is_empty() {
        return Err(Rejection::NoBookmakers);
    }

    let home = raw.home_team.as_deref();
    let away = raw.away_team.as_deref();

    let mut markets = Vec::new();
    for (kind, collected) in collect_quotes(raw) {
        let CollectedQuotes { quotes, names } = collected;
        match kind {
            MarketKind::Moneyline => markets.push(moneyline_market(quotes, &names, home, away)),
            MarketKind::Spread => match (home, away) {
                (Some(home), Some(away)) => markets.extend(spread_markets(quotes, home, away)),
                _ => debug!(event_id = %raw.id, "spreads without home/away teams, skipped"),
            },
            MarketKind::Totals => markets.extend(totals_markets(quotes)),
            MarketKind::Outright => markets.push(outright_market(quotes, &names)),
        }
    }

    if markets.is_empty() {
        return Err(Rejection::NoMarkets);
    }

    Ok(Event {
        id: raw.id.clone(),
        sport_key: raw.sport_key.clone(),
        sport_title: raw.sport_title.clone().unwrap_or_else(|| raw.sport_key.clone()),
        home_team: raw.home_team.clone(),
        away_team: raw.away_team.clone(),
        commence_time: raw.commence_time,
        markets,
    })
}

/// Quotes of one market kind plus every outcome name the provider listed for
/// it, including names whose quotes were dropped as malformed.
#[derive(Debug, Default)]
struct CollectedQuotes {
    quotes: Vec<Quote>,
    /// Distinct raw names in first-seen order.
    names: Vec<String>,
}

/// Flatten bookmakers into per-kind quote lists, keeping bookmaker order so the
/// selector's first-seen tie-break follows the provider's ordering.
fn collect_quotes(raw: &RawEvent) -> BTreeMap<MarketKind, CollectedQuotes> {
    let mut by_kind: BTreeMap<MarketKind, CollectedQuotes> = BTreeMap::new();

    for bookmaker in &raw.bookmakers {
        for market in &bookmaker.markets {
            let Some(kind) = MarketKind::from_api_key(&market.key) else {
                debug!(market = %market.key, "unsupported market key, skipped");
                continue;
            };
            for outcome in &market.outcomes {
                let collected = by_kind.entry(kind).or_default();
                if !collected.names.contains(&outcome.name) {
                    collected.names.push(outcome.name.clone());
                }
                match to_quote(bookmaker, outcome, kind) {
                    Some(quote) => collected.quotes.push(quote),
                    None => debug!(
                        event_id = %raw.id,
                        bookmaker = %bookmaker.key,
                        outcome = %outcome.name,
                        price = outcome.price,
                        "malformed outcome dropped"
                    ),
                }
            }
        }
    }

    by_kind
}

fn to_quote(bookmaker: &RawBookmaker, outcome: &RawOutcome, kind: MarketKind) -> Option<Quote> {
    let price = integral_price(outcome.price)?;

    let key = match kind {
        MarketKind::Moneyline | MarketKind::Outright => OutcomeKey::named(outcome.name.clone()),
        MarketKind::Spread => OutcomeKey::with_line(outcome.name.clone(), Line::from_point(outcome.point?)?),
        MarketKind::Totals => {
            OutcomeKey::with_line(totals_side(&outcome.name)?, Line::from_point(outcome.point?)?)
        }
    };

    Some(Quote {
        bookmaker_key: bookmaker.key.clone(),
        bookmaker_title: bookmaker.title.clone(),
        outcome: key,
        price,
        last_update: bookmaker.last_update,
    })
}

/// American prices are integers; anything else is a malformed payload.
fn integral_price(price: f64) -> Option<i32> {
    if !price.is_finite() || price.fract() != 0.0 {
        return None;
    }
    if price < f64::from(i32::MIN) || price > f64::from(i32::MAX) {
        return None;
    }
    Some(price as i32)
}

fn totals_side(name: &str) -> Option<&'static str> {
    if name.eq_ignore_ascii_case(OVER) {
        Some(OVER)
    } else if name.eq_ignore_ascii_case(UNDER) {
        Some(UNDER)
    } else {
        None
    }
}

/// `names` are the raw outcome names, so a draw quoted only at a malformed
/// price still has to be covered.
fn moneyline_market(
    quotes: Vec<Quote>,
    names: &[String],
    home: Option<&str>,
    away: Option<&str>,
) -> Market {
    let required = match (home, away) {
        (Some(home), Some(away)) => {
            let mut required = vec![OutcomeKey::named(home), OutcomeKey::named(away)];
            if names.iter().any(|n| n == DRAW) {
                required.push(OutcomeKey::named(DRAW));
            }
            required
        }
        _ => named_outcomes(names),
    };

    Market { kind: MarketKind::Moneyline, line: None, required, quotes }
}

/// One market per line, keyed by the home team's handicap: home -3.5 pairs
/// with away +3.5 and never with away +4.5.
fn spread_markets(quotes: Vec<Quote>, home: &str, away: &str) -> Vec<Market> {
    let mut by_line: BTreeMap<Line, Vec<Quote>> = BTreeMap::new();

    for quote in quotes {
        let Some(line) = quote.outcome.line else { continue };
        let home_line = if quote.outcome.name == home {
            line
        } else if quote.outcome.name == away {
            line.opposite()
        } else {
            debug!(outcome = %quote.outcome, "spread outcome matches neither team, skipped");
            continue;
        };
        by_line.entry(home_line).or_default().push(quote);
    }

    by_line
        .into_iter()
        .map(|(line, quotes)| Market {
            kind: MarketKind::Spread,
            line: Some(line),
            required: vec![
                OutcomeKey::with_line(home, line),
                OutcomeKey::with_line(away, line.opposite()),
            ],
            quotes,
        })
        .collect()
}

fn totals_markets(quotes: Vec<Quote>) -> Vec<Market> {
    let mut by_line: BTreeMap<Line, Vec<Quote>> = BTreeMap::new();
    for quote in quotes {
        if let Some(line) = quote.outcome.line {
            by_line.entry(line).or_default().push(quote);
        }
    }

    by_line
        .into_iter()
        .map(|(line, quotes)| Market {
            kind: MarketKind::Totals,
            line: Some(line),
            required: vec![OutcomeKey::with_line(OVER, line), OutcomeKey::with_line(UNDER, line)],
            quotes,
        })
        .collect()
}

/// Every competitor any bookmaker lists must be covered, whether or not its
/// price was usable.
fn outright_market(quotes: Vec<Quote>, names: &[String]) -> Market {
    Market {
        kind: MarketKind::Outright,
        line: None,
        required: named_outcomes(names),
        quotes,
    }
}

fn named_outcomes(names: &[String]) -> Vec<OutcomeKey> {
    names.iter().map(|n| OutcomeKey::named(n.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ArbitrageEngine;
    use crate::error::AnalysisError;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn parse(json: &str) -> RawEvent {
        serde_json::from_str(json).expect("test payload should parse")
    }

    const GAME: &str = r#"{
        "id": "e1",
        "sport_key": "basketball_nba",
        "sport_title": "NBA",
        "commence_time": "2026-03-02T00:10:00Z",
        "home_team": "Boston Celtics",
        "away_team": "Los Angeles Lakers",
        "bookmakers": [
            {
                "key": "fanduel",
                "title": "FanDuel",
                "last_update": "2026-03-01T11:58:00Z",
                "markets": [
                    {"key": "h2h", "outcomes": [
                        {"name": "Boston Celtics", "price": -150},
                        {"name": "Los Angeles Lakers", "price": 130}
                    ]},
                    {"key": "spreads", "outcomes": [
                        {"name": "Boston Celtics", "price": -110, "point": -3.5},
                        {"name": "Los Angeles Lakers", "price": -110, "point": 3.5}
                    ]},
                    {"key": "totals", "outcomes": [
                        {"name": "Over", "price": -105, "point": 220.5},
                        {"name": "Under", "price": -115, "point": 220.5}
                    ]}
                ]
            },
            {
                "key": "draftkings",
                "title": "DraftKings",
                "last_update": "2026-03-01T11:59:00Z",
                "markets": [
                    {"key": "h2h", "outcomes": [
                        {"name": "Boston Celtics", "price": -140},
                        {"name": "Los Angeles Lakers", "price": 125.5}
                    ]},
                    {"key": "spreads", "outcomes": [
                        {"name": "Boston Celtics", "price": -105, "point": -4.5},
                        {"name": "Los Angeles Lakers", "price": -115, "point": 4.5}
                    ]},
                    {"key": "h2h_lay", "outcomes": [
                        {"name": "Boston Celtics", "price": 200}
                    ]}
                ]
            }
        ]
    }"#;

    #[test]
    fn game_event_builds_one_market_per_line() {
        let event = build_event(&parse(GAME), now(), true).unwrap();

        let labels: Vec<String> = event.markets.iter().map(Market::label).collect();
        assert_eq!(
            labels,
            vec!["h2h", "spreads (-4.5)", "spreads (-3.5)", "totals (220.5)"]
        );

        let spread = &event.markets[2];
        assert_eq!(
            spread.required,
            vec![
                OutcomeKey::with_line("Boston Celtics", Line::from_point(-3.5).unwrap()),
                OutcomeKey::with_line("Los Angeles Lakers", Line::from_point(3.5).unwrap()),
            ]
        );
        assert_eq!(spread.quotes.len(), 2);
        assert!(spread.quotes.iter().all(|q| q.bookmaker_key == "fanduel"));
    }

    #[test]
    fn non_integral_prices_are_dropped() {
        let event = build_event(&parse(GAME), now(), true).unwrap();
        let h2h = &event.markets[0];
        // DraftKings' 125.5 is malformed; its -140 survives.
        assert_eq!(h2h.quotes.len(), 3);
        assert!(h2h.quotes.iter().all(|q| q.price != 125));
    }

    #[test]
    fn moneyline_requires_both_teams_and_draw_only_when_quoted() {
        let event = build_event(&parse(GAME), now(), true).unwrap();
        assert_eq!(event.markets[0].required.len(), 2);

        let soccer = parse(
            r#"{
            "id": "e2", "sport_key": "soccer_epl", "sport_title": "EPL",
            "commence_time": "2026-03-02T15:00:00Z",
            "home_team": "Arsenal", "away_team": "Chelsea",
            "bookmakers": [{"key": "b", "title": "B", "markets": [
                {"key": "h2h", "outcomes": [
                    {"name": "Arsenal", "price": 150},
                    {"name": "Chelsea", "price": 180},
                    {"name": "Draw", "price": 230}
                ]}
            ]}]
        }"#,
        );
        let event = build_event(&soccer, now(), true).unwrap();
        assert_eq!(
            event.markets[0].required,
            vec![
                OutcomeKey::named("Arsenal"),
                OutcomeKey::named("Chelsea"),
                OutcomeKey::named(DRAW)
            ]
        );
    }

    #[test]
    fn malformed_draw_price_keeps_draw_required() {
        let soccer = parse(
            r#"{
            "id": "e5", "sport_key": "soccer_epl", "sport_title": "EPL",
            "commence_time": "2026-03-02T15:00:00Z",
            "home_team": "Arsenal", "away_team": "Chelsea",
            "bookmakers": [{"key": "b", "title": "B", "markets": [
                {"key": "h2h", "outcomes": [
                    {"name": "Arsenal", "price": 150},
                    {"name": "Chelsea", "price": 180},
                    {"name": "Draw", "price": 230.5}
                ]}
            ]}]
        }"#,
        );
        let event = build_event(&soccer, now(), true).unwrap();
        let h2h = &event.markets[0];
        assert_eq!(h2h.quotes.len(), 2);
        assert!(h2h.required.contains(&OutcomeKey::named(DRAW)));

        let analysis = ArbitrageEngine::new(1000.0).analyze_event(&event);
        assert!(!analysis.has_arbitrage);
        assert!(analysis.results.is_empty());
        assert_eq!(
            analysis.skipped[0].reason,
            AnalysisError::IncompleteMarket { missing: vec![DRAW.to_string()] }
        );
    }

    #[test]
    fn malformed_competitor_price_keeps_competitor_required() {
        let raw = parse(
            r#"{
            "id": "o2", "sport_key": "golf_masters_tournament_winner",
            "sport_title": "Masters Tournament Winner",
            "commence_time": "2026-04-09T12:00:00Z",
            "bookmakers": [{"key": "a", "title": "A", "markets": [{"key": "outrights", "outcomes": [
                {"name": "Scottie Scheffler", "price": 450},
                {"name": "Rory McIlroy", "price": 800},
                {"name": "Jon Rahm", "price": 1200.25}
            ]}]}]
        }"#,
        );
        let event = build_event(&raw, now(), true).unwrap();
        let names: Vec<&str> = event.markets[0].required.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Scottie Scheffler", "Rory McIlroy", "Jon Rahm"]);

        let analysis = ArbitrageEngine::new(1000.0).analyze_event(&event);
        assert!(!analysis.has_arbitrage);
        assert!(matches!(
            analysis.skipped[0].reason,
            AnalysisError::IncompleteMarket { .. }
        ));
    }

    #[test]
    fn started_events_are_rejected_when_upcoming_only() {
        let raw = parse(GAME);
        let later = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();
        assert_eq!(build_event(&raw, later, true), Err(Rejection::Started));
        assert!(build_event(&raw, later, false).is_ok());
    }

    #[test]
    fn outright_requires_every_quoted_competitor() {
        let raw = parse(
            r#"{
            "id": "o1", "sport_key": "golf_masters_tournament_winner",
            "sport_title": "Masters Tournament Winner",
            "commence_time": "2026-04-09T12:00:00Z",
            "bookmakers": [
                {"key": "a", "title": "A", "markets": [{"key": "outrights", "outcomes": [
                    {"name": "Scottie Scheffler", "price": 450},
                    {"name": "Rory McIlroy", "price": 800}
                ]}]},
                {"key": "b", "title": "B", "markets": [{"key": "outrights", "outcomes": [
                    {"name": "Rory McIlroy", "price": 900},
                    {"name": "Jon Rahm", "price": 1200}
                ]}]}
            ]
        }"#,
        );
        let event = build_event(&raw, now(), true).unwrap();
        assert_eq!(event.markets.len(), 1);
        let names: Vec<&str> = event.markets[0].required.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Scottie Scheffler", "Rory McIlroy", "Jon Rahm"]);
        assert!(event.home_team.is_none());
    }

    #[test]
    fn build_events_counts_rejections() {
        let empty = parse(
            r#"{"id": "e3", "sport_key": "x", "commence_time": "2026-03-02T00:00:00Z", "bookmakers": []}"#,
        );
        let unsupported = parse(
            r#"{"id": "e4", "sport_key": "x", "commence_time": "2026-03-02T00:00:00Z",
                "bookmakers": [{"key": "b", "title": "B", "markets": [{"key": "player_points", "outcomes": []}]}]}"#,
        );
        let (events, stats) = build_events(&[parse(GAME), empty, unsupported], now(), true);
        assert_eq!(events.len(), 1);
        assert_eq!(stats.events_in, 3);
        assert_eq!(stats.events_built, 1);
        assert_eq!(stats.rejected_no_bookmakers, 1);
        assert_eq!(stats.rejected_no_markets, 1);
        assert_eq!(stats.markets_built, 4);
        assert_eq!(events[0].sport_title, "NBA");
    }

    #[test]
    fn totals_sides_are_canonicalized() {
        assert_eq!(totals_side("over"), Some(OVER));
        assert_eq!(totals_side("UNDER"), Some(UNDER));
        assert_eq!(totals_side("Push"), None);
    }

    #[test]
    fn integral_price_rejects_fractions_and_overflow() {
        assert_eq!(integral_price(-110.0), Some(-110));
        assert_eq!(integral_price(110.5), None);
        assert_eq!(integral_price(f64::NAN), None);
        assert_eq!(integral_price(1e12), None);
    }
}
