//! Category sub-ratings ("Camera 4.2", "Battery life 4.5 out of 5").

use std::sync::OnceLock;

use regex::Regex;

use crate::extraction::Page;
use crate::marketplace::CategoryMarkers;
use crate::text::{element_text, first_number};
use crate::types::CategoryRatings;

/// Names recognised in free text when a marketplace gives no label markup.
pub const VOCABULARY: [&str; 6] = [
    "Camera",
    "Battery",
    "Display",
    "Performance",
    "Design",
    "Value for Money",
];

struct VocabularyPatterns {
    name: &'static str,
    /// `<Category> <number>` inside a rating row.
    in_row: Regex,
    /// `<Category> d.d` anywhere in the raw page.
    in_page: Regex,
}

fn vocabulary() -> &'static [VocabularyPatterns] {
    static PATTERNS: OnceLock<Vec<VocabularyPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        VOCABULARY
            .iter()
            .filter_map(|&name| {
                let escaped = regex::escape(name);
                Some(VocabularyPatterns {
                    name,
                    in_row: Regex::new(&format!(r"(?i)\b{escaped}\s+(\d+(?:\.\d+)?)")).ok()?,
                    in_page: Regex::new(&format!(r"(?i)\b{escaped}\s+(\d\.\d)")).ok()?,
                })
            })
            .collect()
    })
}

/// Collect up to six named 1–5 ratings.
///
/// Structured rows are read first. Only when they produce nothing are the
/// marketplace's raw feature patterns tried, and after those the vocabulary
/// scan over the whole page.
pub fn aggregate_categories(page: &Page<'_>, markers: &CategoryMarkers) -> CategoryRatings {
    let mut ratings = CategoryRatings::new();

    if let Some(rows) = &markers.rows {
        for row in page.document.select(rows) {
            if ratings.is_full() {
                break;
            }
            match (&markers.label, &markers.score) {
                (Some(label), Some(score)) => {
                    let name = row.select(label).next().map(|el| element_text(&el));
                    let value = row
                        .select(score)
                        .next()
                        .and_then(|el| first_number(&element_text(&el)));
                    if let (Some(name), Some(value)) = (name, value) {
                        ratings.insert(&name, value);
                    }
                }
                _ => {
                    let text = element_text(&row);
                    for vocab in vocabulary() {
                        if let Some(value) = capture_number(&vocab.in_row, &text) {
                            ratings.insert(vocab.name, value);
                        }
                    }
                }
            }
        }
    }

    if ratings.is_empty() {
        for re in &markers.feature_patterns {
            for caps in re.captures_iter(page.raw) {
                let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                if let Ok(value) = value.as_str().parse::<f64>() {
                    ratings.insert(name.as_str(), value);
                }
            }
        }
    }

    if ratings.is_empty() {
        for vocab in vocabulary() {
            let first_valid = vocab
                .in_page
                .captures_iter(page.raw)
                .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
                .find(|v| (1.0..=5.0).contains(v));
            if let Some(value) = first_valid {
                ratings.insert(vocab.name, value);
            }
        }
    }

    ratings
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}
