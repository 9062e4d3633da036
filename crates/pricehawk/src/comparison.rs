//! Winner and price delta for a pair of records.

use crate::plausibility::parse_price_amount;
use crate::types::{ComparisonResult, Platform, PriceDifference, ProductRecord, Winner};

/// Score gaps smaller than this are a tie.
pub const TIE_THRESHOLD: u8 = 3;

pub fn compare(flipkart: Option<ProductRecord>, amazon: Option<ProductRecord>) -> ComparisonResult {
    let winner = decide_winner(flipkart.as_ref(), amazon.as_ref());
    let price_difference = match (&flipkart, &amazon) {
        (Some(f), Some(a)) => price_difference(f, a),
        _ => None,
    };
    ComparisonResult {
        flipkart,
        amazon,
        winner,
        price_difference,
    }
}

pub fn decide_winner(flipkart: Option<&ProductRecord>, amazon: Option<&ProductRecord>) -> Winner {
    match (flipkart, amazon) {
        (None, None) => Winner::NoResult,
        (Some(_), None) => Winner::Flipkart,
        (None, Some(_)) => Winner::Amazon,
        (Some(f), Some(a)) => {
            let (fs, az) = (f.total_score(), a.total_score());
            if fs.abs_diff(az) < TIE_THRESHOLD {
                Winner::Tie
            } else if fs > az {
                Winner::Flipkart
            } else {
                Winner::Amazon
            }
        }
    }
}

/// Price gap, or `None` when either price is missing or unreadable.
pub fn price_difference(flipkart: &ProductRecord, amazon: &ProductRecord) -> Option<PriceDifference> {
    let f = parse_price_amount(flipkart.price.as_deref()?)? as f64;
    let a = parse_price_amount(amazon.price.as_deref()?)? as f64;
    let higher = f.max(a);
    if higher <= 0.0 {
        return None;
    }
    let amount = (f - a).abs();
    let cheaper_on = if f < a {
        Platform::Flipkart
    } else {
        Platform::Amazon
    };
    Some(PriceDifference {
        amount: (amount * 100.0).round_ties_even() / 100.0,
        cheaper_on,
        percentage: (amount / higher * 1000.0).round_ties_even() / 10.0,
    })
}
