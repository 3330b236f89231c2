use crate::types::{PricedQuote, Stake, StakeAllocation};

/// Split `total_stake` across the winning quotes so every outcome pays the same.
///
/// `stake_i = S / total / d_i`, hence `stake_i * d_i = S / total` for all i and
/// the profit `S * (1 / total - 1)` is locked in whichever outcome happens.
/// Amounts are left unrounded; rounding for display happens in the report and
/// adds at most half a cent of slack per outcome.
///
/// Returns None when there is nothing to allocate or no arbitrage to lock in.
pub fn allocate(
    best_quotes: &[PricedQuote],
    total_implied_probability: f64,
    total_stake: f64,
) -> Option<StakeAllocation> {
    if best_quotes.is_empty()
        || !total_implied_probability.is_finite()
        || total_implied_probability <= 0.0
        || total_implied_probability >= 1.0
        || !total_stake.is_finite()
        || total_stake <= 0.0
    {
        return None;
    }

    let payout = total_stake / total_implied_probability;
    let stakes = best_quotes
        .iter()
        .map(|best| Stake {
            outcome: best.quote.outcome.clone(),
            bookmaker_key: best.quote.bookmaker_key.clone(),
            amount: payout / best.decimal_odds,
        })
        .collect();

    Some(StakeAllocation {
        total_stake,
        payout,
        profit: payout - total_stake,
        stakes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::price::normalize;
    use crate::types::{OutcomeKey, Quote};

    fn priced(name: &str, price: i32) -> PricedQuote {
        let p = normalize(price).unwrap();
        PricedQuote {
            quote: Quote {
                bookmaker_key: format!("{name}-book"),
                bookmaker_title: "Book".to_string(),
                outcome: OutcomeKey::named(name),
                price,
                last_update: None,
            },
            decimal_odds: p.decimal_odds,
            implied_probability: p.implied_probability,
        }
    }

    fn total(quotes: &[PricedQuote]) -> f64 {
        quotes.iter().map(|q| q.implied_probability).sum()
    }

    #[test]
    fn two_way_split_matches_reference_numbers() {
        let quotes = vec![priced("A", 150), priced("B", -125)];
        let alloc = allocate(&quotes, total(&quotes), 1000.0).unwrap();

        assert!((alloc.stakes[0].amount - 418.60).abs() < 0.01, "{}", alloc.stakes[0].amount);
        assert!((alloc.stakes[1].amount - 581.40).abs() < 0.01, "{}", alloc.stakes[1].amount);
        assert!((alloc.payout - 1046.51).abs() < 0.01);
        assert!((alloc.profit - 46.51).abs() < 0.01);
        assert_eq!(alloc.stakes[0].bookmaker_key, "A-book");
    }

    #[test]
    fn payout_is_equal_for_every_outcome() {
        let quotes = vec![priced("Home", 210), priced("Draw", 240), priced("Away", 260)];
        let alloc = allocate(&quotes, total(&quotes), 500.0).unwrap();

        for (stake, quote) in alloc.stakes.iter().zip(&quotes) {
            let returned = stake.amount * quote.decimal_odds;
            assert!((returned - alloc.payout).abs() < 1e-9);
        }
        let staked: f64 = alloc.stakes.iter().map(|s| s.amount).sum();
        assert!((staked - 500.0).abs() < 1e-9);
    }

    #[test]
    fn rounded_stakes_stay_within_slack() {
        let quotes = vec![priced("A", 150), priced("B", -125)];
        let alloc = allocate(&quotes, total(&quotes), 1000.0).unwrap();
        let rounded: Vec<f64> = alloc
            .stakes
            .iter()
            .map(|s| (s.amount * 100.0).round() / 100.0)
            .collect();
        let sum: f64 = rounded.iter().sum();
        assert!((sum - 1000.0).abs() <= 0.005 * rounded.len() as f64);
    }

    #[test]
    fn no_allocation_without_arbitrage() {
        let quotes = vec![priced("A", -110), priced("B", -110)];
        assert!(allocate(&quotes, total(&quotes), 1000.0).is_none());
    }

    #[test]
    fn degenerate_inputs_return_none() {
        let quotes = vec![priced("A", 150), priced("B", -125)];
        assert!(allocate(&[], 0.9, 1000.0).is_none());
        assert!(allocate(&quotes, 0.0, 1000.0).is_none());
        assert!(allocate(&quotes, f64::NAN, 1000.0).is_none());
        assert!(allocate(&quotes, total(&quotes), 0.0).is_none());
    }
}
