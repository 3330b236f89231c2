use crate::error::AnalysisError;

/// Smallest magnitude an American price can have. +100 and -100 both mean
/// even money (decimal 2.0).
pub const MIN_PRICE_MAGNITUDE: u32 = 100;

/// An American price converted to decimal odds and implied probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPrice {
    pub american: i32,
    /// Always > 1.
    pub decimal_odds: f64,
    /// Always in (0, 1).
    pub implied_probability: f64,
}

/// Convert an American price into decimal odds and implied probability.
///
/// `+150` → 2.5 / 0.4, `-200` → 1.5 / 0.6667. Zero and sub-100 magnitudes
/// have no meaning on the American scale and return `InvalidPrice`.
pub fn normalize(price: i32) -> Result<NormalizedPrice, AnalysisError> {
    let magnitude = price.unsigned_abs();
    if magnitude < MIN_PRICE_MAGNITUDE {
        return Err(AnalysisError::InvalidPrice { price });
    }

    let decimal_odds = if price > 0 {
        f64::from(magnitude) / 100.0 + 1.0
    } else {
        100.0 / f64::from(magnitude) + 1.0
    };

    Ok(NormalizedPrice {
        american: price,
        decimal_odds,
        implied_probability: 1.0 / decimal_odds,
    })
}
