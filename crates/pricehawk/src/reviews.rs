//! Review harvesting.
//!
//! Two phases: marketplace review cards first, then (only when the cards
//! yielded fewer than three reviews) a keyword heuristic over generic text
//! containers. Output is capped, deduplicated, and kept in discovery order.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use crate::extraction::Page;
use crate::marketplace::ReviewMarkers;
use crate::text::{char_len, collapse_whitespace, element_text, first_number, truncate_chars};
use crate::types::Review;

pub const MAX_REVIEWS: usize = 10;
pub const MAX_REVIEW_CHARS: usize = 400;

const HEURISTIC_BELOW: usize = 3;
const HEURISTIC_MIN_CHARS: usize = 50;
const HEURISTIC_MAX_CHARS: usize = 800;
const HEURISTIC_MIN_KEYWORDS: usize = 2;
const RATING_GUESS_CHARS: usize = 50;
const CARD_DEFAULT_RATING: u8 = 5;
const GUESS_DEFAULT_RATING: u8 = 4;

const KEYWORDS: [&str; 17] = [
    "camera",
    "battery",
    "display",
    "screen",
    "phone",
    "product",
    "quality",
    "good",
    "excellent",
    "best",
    "build",
    "performance",
    "fast",
    "value",
    "money",
    "happy",
    "satisfied",
];

fn noise_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Certified Buyer|Verified (?:Buyer|Purchase)|\d+\s+\w+\s+ago")
            .expect("review noise regex is valid")
    })
}

fn standalone_digit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-5])\b").expect("rating digit regex is valid"))
}

/// Accumulates reviews while enforcing the cap and text uniqueness.
#[derive(Default)]
struct Harvest {
    reviews: Vec<Review>,
    seen: HashSet<String>,
}

impl Harvest {
    fn is_full(&self) -> bool {
        self.reviews.len() >= MAX_REVIEWS
    }

    fn push(&mut self, rating: u8, text: &str) {
        if self.is_full() {
            return;
        }
        let text = truncate_chars(text, MAX_REVIEW_CHARS);
        if self.seen.insert(text.clone()) {
            self.reviews.push(Review { rating, text });
        }
    }
}

pub fn harvest_reviews(page: &Page<'_>, markers: &ReviewMarkers) -> Vec<Review> {
    let mut harvest = Harvest::default();
    harvest_cards(page, markers, &mut harvest);
    if harvest.reviews.len() < HEURISTIC_BELOW {
        harvest_heuristic(page, markers, &mut harvest);
    }
    harvest.reviews
}

fn harvest_cards(page: &Page<'_>, markers: &ReviewMarkers, harvest: &mut Harvest) {
    let cards: Vec<ElementRef<'_>> = markers
        .containers
        .iter()
        .map(|sel| page.document.select(sel).take(MAX_REVIEWS).collect::<Vec<_>>())
        .find(|cards| !cards.is_empty())
        .unwrap_or_default();

    for card in cards {
        let rating = card_rating(&card, markers);
        let title = first_text(&card, &markers.title);
        let body = first_text(&card, &markers.body).unwrap_or_else(|| element_text(&card));
        let text = match title {
            Some(title) if !body.is_empty() => format!("{title} — {body}"),
            Some(title) => title,
            None => body,
        };
        let text = collapse_whitespace(&text);
        let len = char_len(&text);
        if (markers.min_len..=markers.max_len).contains(&len) {
            harvest.push(rating, &text);
        }
    }
}

fn first_text(card: &ElementRef<'_>, selectors: &[scraper::Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| card.select(sel).next())
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

fn card_rating(card: &ElementRef<'_>, markers: &ReviewMarkers) -> u8 {
    let marked = markers
        .rating
        .iter()
        .find_map(|sel| card.select(sel).next())
        .and_then(|el| first_number(&element_text(&el)));
    let standalone = || {
        markers
            .standalone_rating
            .then(|| {
                card.text()
                    .map(str::trim)
                    .find(|t| matches!(*t, "1" | "2" | "3" | "4" | "5"))
                    .and_then(|t| t.parse::<f64>().ok())
            })
            .flatten()
    };
    match marked.or_else(standalone) {
        Some(value) => value.floor().clamp(1.0, 5.0) as u8,
        None => CARD_DEFAULT_RATING,
    }
}

fn harvest_heuristic(page: &Page<'_>, markers: &ReviewMarkers, harvest: &mut Harvest) {
    let Some(containers) = &markers.heuristic else {
        return;
    };
    for el in page.document.select(containers) {
        if harvest.is_full() {
            break;
        }
        let raw = element_text(&el);
        let cleaned = collapse_whitespace(&noise_pattern().replace_all(&raw, ""));
        let len = char_len(&cleaned);
        if !(HEURISTIC_MIN_CHARS..=HEURISTIC_MAX_CHARS).contains(&len) {
            continue;
        }
        if keyword_hits(&cleaned) < HEURISTIC_MIN_KEYWORDS {
            continue;
        }
        harvest.push(guess_rating(&raw), &cleaned);
    }
}

/// Distinct review keywords in `text`.
fn keyword_hits(text: &str) -> usize {
    let words: HashSet<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .collect();
    KEYWORDS.iter().filter(|k| words.contains(**k)).count()
}

/// First standalone digit 1–5 near the start of the text, else 4.
fn guess_rating(text: &str) -> u8 {
    let lead = truncate_chars(text, RATING_GUESS_CHARS);
    standalone_digit()
        .captures(&lead)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(GUESS_DEFAULT_RATING)
}
