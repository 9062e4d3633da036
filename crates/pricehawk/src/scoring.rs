//! Deterministic 0–100 recommendation score.
//!
//! | component | max | input                                   |
//! |-----------|-----|-----------------------------------------|
//! | rating    | 40  | aggregate star rating                   |
//! | sentiment | 30  | share of reviews rated 4 or 5 (≥2 reviews) |
//! | category  | 20  | mean category sub-rating                |
//! | specs     | 10  | populated specification fields out of 6 |

use crate::types::{Breakdown, Field, ProductRecord, Score, Verdict};

pub const MAX_REASONS: usize = 5;
const MIN_REVIEWS_FOR_SENTIMENT: usize = 2;
const OUTSTANDING_CATEGORY: f64 = 4.5;

/// Half-to-even, so `84.5` scores 84.
fn round1(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

pub fn score(record: &ProductRecord) -> Score {
    let mut breakdown = Breakdown::default();
    let mut reasons = Vec::new();

    if let Some(rating) = record.rating {
        let (points, word) = match rating {
            r if r >= 4.5 => (40.0, "Exceptional"),
            r if r >= 4.0 => (33.0, "Excellent"),
            r if r >= 3.5 => (25.0, "Good"),
            r if r >= 3.0 => (16.0, "Average"),
            _ => (8.0, "Low"),
        };
        breakdown.rating_score = points;
        reasons.push(format!("{word} {rating:.1}/5 customer rating"));
    }

    let reviews = &record.reviews;
    if reviews.len() >= MIN_REVIEWS_FOR_SENTIMENT {
        let positive = reviews.iter().filter(|r| r.rating >= 4).count();
        let ratio = positive as f64 / reviews.len() as f64;
        let percent = (ratio * 100.0).round_ties_even();
        let (points, reason) = if ratio >= 0.9 {
            (30.0, format!("{percent}% of reviews are positive"))
        } else if ratio >= 0.75 {
            (24.0, format!("{percent}% positive review sentiment"))
        } else if ratio >= 0.6 {
            (17.0, format!("{percent}% positive review sentiment"))
        } else {
            (8.0, "Mixed or mostly negative reviews".to_string())
        };
        breakdown.sentiment_score = points;
        reasons.push(reason);
    }

    if let Some(mean) = record.category_ratings.mean() {
        breakdown.category_score = round1(mean / 5.0 * 20.0);
        let standouts: Vec<&str> = record
            .category_ratings
            .iter()
            .filter(|(_, v)| *v >= OUTSTANDING_CATEGORY)
            .map(|(name, _)| name)
            .take(2)
            .collect();
        if !standouts.is_empty() {
            reasons.push(format!("Outstanding {} performance", standouts.join(", ")));
        }
    }

    let present = record.specs_present();
    let total_specs = Field::SPECS.len();
    breakdown.specs_score = round1(present as f64 / total_specs as f64 * 10.0);
    if present >= 5 {
        reasons.push(format!(
            "Detailed specifications available ({present}/{total_specs})"
        ));
    } else if present >= 3 {
        reasons.push(format!("Partial specs available ({present}/{total_specs})"));
    }

    reasons.truncate(MAX_REASONS);
    let total = breakdown.sum().round_ties_even().clamp(0.0, 100.0) as u8;
    Score {
        total,
        verdict: Verdict::from_total(total),
        reasons,
        breakdown,
    }
}

/// Score a record in place.
pub fn apply_score(record: &mut ProductRecord) {
    record.score = Some(score(record));
}
