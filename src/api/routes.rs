use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::health::HealthState;
use crate::api::latency::{Percentiles, ScanLatency};
use crate::error::AppError;
use crate::report::{html, EventReport};
use crate::state::AnalysisStore;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<AnalysisStore>,
    pub health: Arc<HealthState>,
    pub latency: Arc<ScanLatency>,
    pub total_stake: f64,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/events", get(get_events))
        .route("/events/:id", get(get_event))
        .route("/arbitrage", get(get_arbitrage))
        .route("/report", get(get_report))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EventsQuery {
    pub sport: Option<String>,
    /// Minimum profit percentage; implies arbitrage-only.
    pub min_profit: Option<f64>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub scans_completed: u64,
    pub scans_failed: u64,
    pub events_analyzed: u64,
    pub arbitrage_found: u64,
    pub quota_remaining: Option<u64>,
    pub quota_used: Option<u64>,
    pub scan_duration: Percentiles,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_events(
    State(state): State<ApiState>,
    Query(params): Query<EventsQuery>,
) -> Json<Vec<EventReport>> {
    let events = state
        .store
        .query(params.sport.as_deref(), params.min_profit, params.limit)
        .iter()
        .map(EventReport::from_analysis)
        .collect();
    Json(events)
}

async fn get_event(
    State(state): State<ApiState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventReport>, AppError> {
    let analysis = state
        .store
        .get(&event_id)
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;
    Ok(Json(EventReport::from_analysis(&analysis)))
}

async fn get_arbitrage(State(state): State<ApiState>) -> Json<Vec<EventReport>> {
    Json(state.store.arbitrage().iter().map(EventReport::from_analysis).collect())
}

async fn get_report(State(state): State<ApiState>) -> Result<Html<String>, AppError> {
    let report = state
        .store
        .snapshot(state.total_stake)
        .ok_or_else(|| AppError::NotFound("no scan has completed yet".to_string()))?;
    Ok(Html(html::render(&report)))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let health = &state.health;
    let quota = health.quota();
    let status = if health.scans_completed() > 0 { "ok" } else { "starting" };

    Json(HealthResponse {
        status,
        last_scan_at: health.last_scan_at_ms().and_then(DateTime::<Utc>::from_timestamp_millis),
        scans_completed: health.scans_completed(),
        scans_failed: health.scans_failed(),
        events_analyzed: health.events_analyzed(),
        arbitrage_found: health.arbitrage_found(),
        quota_remaining: quota.remaining,
        quota_used: quota.used,
        scan_duration: state.latency.percentiles(),
    })
}
