use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

/// Local, non-fatal conditions raised by the arbitrage engine. The affected
/// quote or market is left out of the results; nothing aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    /// Zero or sub-100 magnitude American price. Only the quote is dropped.
    #[error("invalid American price {price}")]
    InvalidPrice { price: i32 },

    #[error("incomplete market: no quote for {}", missing.join(", "))]
    IncompleteMarket { missing: Vec<String> },

    #[error("empty market: no quotes")]
    EmptyMarket,

    /// Fewer than two required outcomes; there is no opposing side to cover.
    #[error("single-outcome market: {outcomes} required outcome(s)")]
    SingleOutcome { outcomes: usize },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Odds API returned status {status} for {endpoint}")]
    ApiStatus { status: u16, endpoint: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ApiStatus { .. } | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
