use std::collections::HashMap;

use tracing::debug;

use crate::engine::price::{normalize, NormalizedPrice};
use crate::types::{OutcomeKey, PricedQuote, Quote};

/// Best available quote for one required outcome, or None if no bookmaker
/// offers a valid price for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub outcome: OutcomeKey,
    pub best: Option<PricedQuote>,
}

/// Pick the best quote for every required outcome.
///
/// A larger signed American price is always the better payout (+150 > +120,
/// -105 > -150, +100 > any negative), so the comparison is on the raw integer.
/// On equal prices the quote seen first in `quotes` keeps the slot: the result
/// is order-independent except among exact ties.
///
/// Invalid prices are dropped before comparison. Quotes for outcomes outside
/// `required` are ignored. One pass over `quotes`.
pub fn select_best(required: &[OutcomeKey], quotes: &[Quote]) -> Vec<Selection> {
    let mut best: HashMap<&OutcomeKey, (&Quote, NormalizedPrice)> =
        HashMap::with_capacity(required.len());

    for quote in quotes {
        if !required.contains(&quote.outcome) {
            debug!(
                bookmaker = %quote.bookmaker_key,
                outcome = %quote.outcome,
                "quote for outcome outside market, ignored"
            );
            continue;
        }
        let price = match normalize(quote.price) {
            Ok(p) => p,
            Err(e) => {
                debug!(
                    bookmaker = %quote.bookmaker_key,
                    outcome = %quote.outcome,
                    "quote excluded: {e}"
                );
                continue;
            }
        };
        match best.get(&quote.outcome) {
            Some((_, current)) if price.american <= current.american => {}
            _ => {
                best.insert(&quote.outcome, (quote, price));
            }
        }
    }

    required
        .iter()
        .map(|outcome| Selection {
            outcome: outcome.clone(),
            best: best.get(outcome).map(|(quote, price)| PricedQuote {
                quote: (*quote).clone(),
                decimal_odds: price.decimal_odds,
                implied_probability: price.implied_probability,
            }),
        })
        .collect()
}
