//! Field-specific plausibility predicates.
//!
//! Every candidate produced by any extraction strategy passes through
//! [`Plausibility::check`] before it can populate a record. A candidate that
//! fails is simply skipped and the cascade moves on.

use url::Url;

use crate::text::{collapse_whitespace, first_number, truncate_chars};
use crate::types::{Field, FieldValue};

pub const BRAND_MAX_CHARS: usize = 40;
pub const SPEC_MAX_CHARS: usize = 60;

/// Marketplace-specific acceptance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plausibility {
    pub price_min: u64,
    pub price_max: u64,
}

impl Default for Plausibility {
    fn default() -> Self {
        Self {
            price_min: 100,
            price_max: 2_000_000,
        }
    }
}

impl Plausibility {
    pub fn new(price_min: u64, price_max: u64) -> Self {
        Self {
            price_min,
            price_max,
        }
    }

    /// Validate and normalize a raw candidate for `field`.
    pub fn check(&self, field: Field, raw: &str) -> Option<FieldValue> {
        match field {
            Field::Price => {
                let amount = parse_price_amount(raw)?;
                (self.price_min..=self.price_max)
                    .contains(&amount)
                    .then(|| FieldValue::Text(format_rupees(amount)))
            }
            Field::Rating => {
                let value = first_number(raw)?;
                (1.0..=5.0)
                    .contains(&value)
                    .then(|| FieldValue::Rating((value * 10.0).round() / 10.0))
            }
            Field::Image => {
                let candidate = raw.trim();
                let url = Url::parse(candidate).ok()?;
                matches!(url.scheme(), "http" | "https")
                    .then(|| FieldValue::Text(candidate.to_string()))
            }
            Field::Brand => non_empty(raw, Some(BRAND_MAX_CHARS)),
            Field::Title => non_empty(raw, None),
            _ => non_empty(raw, Some(SPEC_MAX_CHARS)),
        }
    }
}

fn non_empty(raw: &str, cap: Option<usize>) -> Option<FieldValue> {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return None;
    }
    let text = match cap {
        Some(max) => truncate_chars(&text, max),
        None => text,
    };
    Some(FieldValue::Text(text))
}

/// Integer rupee amount in a price string.
///
/// Currency marks and thousands separators are ignored; digits stop at the
/// first decimal point, so `"₹18,999.00"` and `"Rs. 18999"` both read as
/// 18999.
pub fn parse_price_amount(text: &str) -> Option<u64> {
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if digits.is_empty() || c == ',' {
            continue;
        } else {
            break;
        }
    }
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Format an amount as `₹` with a separator every three digits
/// (`₹18,999`, `₹1,299,000`).
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("₹{out}")
}
