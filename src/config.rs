use crate::error::{AppError, Result};

pub const ODDS_API_URL: &str = "https://api.the-odds-api.com/v4";

/// Markets requested for head-to-head sports.
pub const GAME_MARKETS: &str = "h2h,spreads,totals";

/// Markets requested for futures-style sports (tournament winners etc).
pub const OUTRIGHT_MARKETS: &str = "outrights";

/// Stake budget used when TOTAL_STAKE is not set.
pub const DEFAULT_TOTAL_STAKE: f64 = 1000.0;

/// Pause between per-sport odds requests so the provider does not rate limit us.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 200;

/// Timeout applied to every odds provider request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

pub const JSON_OUTPUT: &str = "arbitrage_opportunities.json";
pub const HTML_OUTPUT: &str = "arbitrage_opportunities.html";

/// Raw provider events saved by every fetch and replayed by `analyze`.
pub const RAW_SNAPSHOT: &str = "raw_events.json";

/// Decimal places used when stakes are shown to a human or written to a report.
pub const STAKE_DISPLAY_DECIMALS: usize = 2;

/// Where a run gets its events from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Pull odds from the provider and save a raw snapshot.
    Fetch,
    /// Re-analyze the raw snapshot without touching the provider.
    Analyze,
}

impl ScanMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fetch" => Some(Self::Fetch),
            "analyze" => Some(Self::Analyze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: ScanMode,
    /// Empty in analyze mode, where the provider is never called
    pub api_key: String,
    pub odds_api_url: String,
    /// Bookmaker regions, comma-separated (ODDS_REGIONS)
    pub regions: String,
    /// Stake budget split across outcomes of an arbitrage market (TOTAL_STAKE)
    pub total_stake: f64,
    /// Delay between per-sport requests in milliseconds (REQUEST_DELAY_MS)
    pub request_delay_ms: u64,
    /// Drop events whose commence time has already passed (UPCOMING_ONLY)
    pub upcoming_only: bool,
    pub json_output: String,
    pub html_output: String,
    /// Raw events snapshot path (RAW_SNAPSHOT)
    pub raw_snapshot: String,
    /// 0 runs a single scan and exits; otherwise rescans on this interval
    /// and serves results over HTTP (SCAN_INTERVAL_SECS)
    pub scan_interval_secs: u64,
    pub api_port: u16,
    pub log_level: String,
}

impl Config {
    /// Environment config. A first CLI argument (`fetch` / `analyze`) takes
    /// precedence over SCAN_MODE.
    pub fn from_env() -> Result<Self> {
        let mode_arg = std::env::args().nth(1);
        Self::from_lookup(|key| match key {
            "SCAN_MODE" if mode_arg.is_some() => mode_arg.clone(),
            _ => std::env::var(key).ok(),
        })
    }

    /// Build a config from an arbitrary variable source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("SCAN_MODE") {
            Some(raw) => ScanMode::parse(&raw)
                .ok_or_else(|| AppError::Config("SCAN_MODE must be fetch or analyze".to_string()))?,
            None => ScanMode::Fetch,
        };

        let api_key = lookup("ODDS_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let api_key = match (mode, api_key) {
            (_, Some(key)) => key,
            (ScanMode::Analyze, None) => String::new(),
            (ScanMode::Fetch, None) => {
                return Err(AppError::Config("ODDS_API_KEY must be set".to_string()))
            }
        };

        let scan_interval_secs = lookup("SCAN_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        if mode == ScanMode::Analyze && scan_interval_secs > 0 {
            return Err(AppError::Config(
                "analyze mode runs once; unset SCAN_INTERVAL_SECS".to_string(),
            ));
        }

        let total_stake = match lookup("TOTAL_STAKE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::Config("TOTAL_STAKE must be a number".to_string()))?,
            None => DEFAULT_TOTAL_STAKE,
        };
        if !total_stake.is_finite() || total_stake <= 0.0 {
            return Err(AppError::Config("TOTAL_STAKE must be greater than zero".to_string()));
        }

        let upcoming_only = match lookup("UPCOMING_ONLY") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::Config("UPCOMING_ONLY must be true or false".to_string()))?,
            None => true,
        };

        Ok(Self {
            mode,
            api_key,
            odds_api_url: lookup("ODDS_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| ODDS_API_URL.to_string()),
            regions: lookup("ODDS_REGIONS").unwrap_or_else(|| "us".to_string()),
            total_stake,
            request_delay_ms: lookup("REQUEST_DELAY_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            upcoming_only,
            json_output: lookup("JSON_OUTPUT").unwrap_or_else(|| JSON_OUTPUT.to_string()),
            html_output: lookup("HTML_OUTPUT").unwrap_or_else(|| HTML_OUTPUT.to_string()),
            raw_snapshot: lookup("RAW_SNAPSHOT").unwrap_or_else(|| RAW_SNAPSHOT.to_string()),
            scan_interval_secs,
            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn is_continuous(&self) -> bool {
        self.scan_interval_secs > 0
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = config_from(&[("ODDS_API_KEY", "abc123")]).unwrap();
        assert_eq!(cfg.api_key, "abc123");
        assert_eq!(cfg.odds_api_url, ODDS_API_URL);
        assert_eq!(cfg.regions, "us");
        assert_eq!(cfg.total_stake, DEFAULT_TOTAL_STAKE);
        assert_eq!(cfg.request_delay_ms, DEFAULT_REQUEST_DELAY_MS);
        assert!(cfg.upcoming_only);
        assert_eq!(cfg.json_output, JSON_OUTPUT);
        assert_eq!(cfg.html_output, HTML_OUTPUT);
        assert_eq!(cfg.raw_snapshot, RAW_SNAPSHOT);
        assert_eq!(cfg.mode, ScanMode::Fetch);
        assert!(!cfg.is_continuous());
        assert_eq!(cfg.api_port, 3000);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = config_from(&[("ODDS_API_KEY", "   ")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn stake_must_be_positive() {
        for bad in ["0", "-50", "abc", "NaN"] {
            let result = config_from(&[("ODDS_API_KEY", "k"), ("TOTAL_STAKE", bad)]);
            assert!(result.is_err(), "TOTAL_STAKE={bad} should be rejected");
        }
        let cfg = config_from(&[("ODDS_API_KEY", "k"), ("TOTAL_STAKE", "250.5")]).unwrap();
        assert_eq!(cfg.total_stake, 250.5);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config_from(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_API_URL", "http://localhost:9999/v4/"),
            ("ODDS_REGIONS", "us,uk"),
            ("UPCOMING_ONLY", "false"),
            ("SCAN_INTERVAL_SECS", "120"),
            ("API_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(cfg.odds_api_url, "http://localhost:9999/v4");
        assert_eq!(cfg.regions, "us,uk");
        assert!(!cfg.upcoming_only);
        assert!(cfg.is_continuous());
        assert_eq!(cfg.scan_interval_secs, 120);
        assert_eq!(cfg.api_port, 8080);
    }

    #[test]
    fn analyze_mode_needs_no_key_and_runs_once() {
        let cfg = config_from(&[("SCAN_MODE", "Analyze"), ("RAW_SNAPSHOT", "/tmp/raw.json")]).unwrap();
        assert_eq!(cfg.mode, ScanMode::Analyze);
        assert!(cfg.api_key.is_empty());
        assert_eq!(cfg.raw_snapshot, "/tmp/raw.json");

        let err = config_from(&[("SCAN_MODE", "analyze"), ("SCAN_INTERVAL_SECS", "60")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        assert!(config_from(&[("ODDS_API_KEY", "k"), ("SCAN_MODE", "replay")]).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        let result = config_from(&[("ODDS_API_KEY", "k"), ("API_PORT", "70000")]);
        assert!(result.is_err());
    }
}
