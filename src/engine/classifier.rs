use crate::engine::selector::Selection;
use crate::error::AnalysisError;

/// Markets need at least two sides before a sum of probabilities means anything.
pub const MIN_MARKET_OUTCOMES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Sum of best-quote implied probabilities, as a fraction.
    pub total_implied_probability: f64,
    pub has_arbitrage: bool,
    /// `(1 / total - 1) * 100` when arbitrage exists, else 0.
    pub potential_profit_pct: f64,
}

/// Classify a market from its per-outcome selections.
///
/// Returns an error (indeterminate market) unless every required outcome has a
/// winning quote. An indeterminate market is neither arbitrage nor
/// non-arbitrage; callers skip it.
pub fn classify(selections: &[Selection]) -> Result<Classification, AnalysisError> {
    if selections.is_empty() {
        return Err(AnalysisError::EmptyMarket);
    }
    if selections.len() < MIN_MARKET_OUTCOMES {
        return Err(AnalysisError::SingleOutcome { outcomes: selections.len() });
    }

    let missing: Vec<String> = selections
        .iter()
        .filter(|s| s.best.is_none())
        .map(|s| s.outcome.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::IncompleteMarket { missing });
    }

    let total: f64 = selections
        .iter()
        .filter_map(|s| s.best.as_ref())
        .map(|b| b.implied_probability)
        .sum();

    // Only reachable with no usable probabilities at all; never divide by it.
    if !total.is_finite() || total <= 0.0 {
        return Err(AnalysisError::EmptyMarket);
    }

    let has_arbitrage = total < 1.0;
    let potential_profit_pct = if has_arbitrage {
        (1.0 / total - 1.0) * 100.0
    } else {
        0.0
    };

    Ok(Classification {
        total_implied_probability: total,
        has_arbitrage,
        potential_profit_pct,
    })
}
