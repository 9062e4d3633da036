//! Per-marketplace extraction knowledge.
//!
//! Selector probes, raw-text patterns, review markers, and category markers
//! live in `marketplaces.json`, embedded at compile time with
//! `include_str!`. The file is parsed and compiled once per process; the
//! cascade code itself is identical for every marketplace.
//!
//! Entries that fail to compile (bad CSS, bad regex, unknown field names) are
//! skipped with a warning rather than poisoning the whole profile.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Deserialize;
use tracing::warn;

use crate::plausibility::Plausibility;
use crate::text::element_text;
use crate::types::{Field, Platform, PricehawkError, PricehawkResult};

const MARKETPLACES_JSON: &str = include_str!("marketplaces.json");

// ── Raw (deserialized) shapes ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawProfile {
    price_min: u64,
    price_max: u64,
    #[serde(default)]
    pattern_price_floor: Option<u64>,
    #[serde(default)]
    selectors: HashMap<String, Vec<RawProbe>>,
    #[serde(default)]
    patterns: HashMap<String, Vec<String>>,
    #[serde(default)]
    reviews: RawReviews,
    #[serde(default)]
    categories: RawCategories,
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    selector: String,
    #[serde(default)]
    attrs: Vec<String>,
    #[serde(default)]
    capture: Option<String>,
    #[serde(default)]
    strip: Option<String>,
    #[serde(default)]
    strip_query: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawReviews {
    #[serde(default)]
    containers: Vec<String>,
    #[serde(default)]
    rating: Vec<String>,
    #[serde(default)]
    standalone_rating: bool,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    body: Vec<String>,
    #[serde(default)]
    min_len: Option<usize>,
    #[serde(default)]
    max_len: Option<usize>,
    #[serde(default)]
    heuristic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCategories {
    #[serde(default)]
    rows: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    feature_patterns: Vec<String>,
}

// ── Compiled profile ─────────────────────────────────────────────────────────

/// One selector-table entry.
#[derive(Debug, Clone)]
pub struct Probe {
    pub selector: Selector,
    /// Attributes read in order instead of the element text.
    pub attrs: Vec<String>,
    /// Group 1 of this regex is the candidate.
    pub capture: Option<Regex>,
    /// Removed from the candidate.
    pub strip: Option<Regex>,
    pub strip_query: bool,
}

impl Probe {
    /// Raw candidate read from one matched element, before plausibility.
    pub fn read(&self, el: &ElementRef<'_>) -> Option<String> {
        let mut value = if self.attrs.is_empty() {
            element_text(el)
        } else {
            self.attrs
                .iter()
                .filter_map(|name| el.value().attr(name))
                .find(|v| !v.trim().is_empty())?
                .trim()
                .to_string()
        };

        if let Some(re) = &self.capture {
            value = re.captures(&value)?.get(1)?.as_str().trim().to_string();
        }
        if let Some(re) = &self.strip {
            value = re.replace_all(&value, "").trim().to_string();
        }
        if self.strip_query {
            if let Some(idx) = value.find('?') {
                value.truncate(idx);
            }
        }
        (!value.is_empty()).then_some(value)
    }
}

/// Review card markers for the structured harvesting phase.
#[derive(Debug, Clone, Default)]
pub struct ReviewMarkers {
    /// Tried in order; the first one with any match supplies the cards.
    pub containers: Vec<Selector>,
    pub rating: Vec<Selector>,
    /// Accept a bare `1`–`5` text node inside the card as its rating.
    pub standalone_rating: bool,
    pub title: Vec<Selector>,
    pub body: Vec<Selector>,
    pub min_len: usize,
    pub max_len: usize,
    /// Generic text containers walked by the heuristic phase.
    pub heuristic: Option<Selector>,
}

/// Category sub-rating markers.
#[derive(Debug, Clone, Default)]
pub struct CategoryMarkers {
    pub rows: Option<Selector>,
    pub label: Option<Selector>,
    pub score: Option<Selector>,
    /// Raw-document patterns capturing `(name, score)`.
    pub feature_patterns: Vec<Regex>,
}

/// Compiled extraction knowledge for one marketplace.
#[derive(Debug, Clone)]
pub struct MarketplaceProfile {
    pub platform: Platform,
    pub gate: Plausibility,
    /// Extra lower bound applied to prices found by raw-text patterns.
    pub pattern_price_floor: Option<u64>,
    pub selectors: HashMap<Field, Vec<Probe>>,
    pub patterns: HashMap<Field, Vec<Regex>>,
    pub reviews: ReviewMarkers,
    pub categories: CategoryMarkers,
}

impl MarketplaceProfile {
    /// A profile that knows no markers. Structured data still works.
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            gate: Plausibility::default(),
            pattern_price_floor: None,
            selectors: HashMap::new(),
            patterns: HashMap::new(),
            reviews: ReviewMarkers::default(),
            categories: CategoryMarkers::default(),
        }
    }

    /// Compile the profile for `platform` out of a marketplaces document.
    pub fn from_json(json: &str, platform: Platform) -> PricehawkResult<Self> {
        let mut all: HashMap<String, RawProfile> = serde_json::from_str(json)?;
        let raw = all.remove(platform.as_str()).ok_or_else(|| {
            PricehawkError::Profile(format!("no entry for marketplace '{platform}'"))
        })?;
        if raw.price_min > raw.price_max {
            return Err(PricehawkError::Profile(format!(
                "{platform}: price_min {} exceeds price_max {}",
                raw.price_min, raw.price_max
            )));
        }

        let mut selectors = HashMap::new();
        for (key, probes) in raw.selectors {
            let Some(field) = parse_field(platform, &key) else {
                continue;
            };
            let compiled: Vec<Probe> = probes
                .iter()
                .filter_map(|p| compile_probe(platform, field, p))
                .collect();
            selectors.insert(field, compiled);
        }

        let mut patterns = HashMap::new();
        for (key, sources) in raw.patterns {
            let Some(field) = parse_field(platform, &key) else {
                continue;
            };
            let compiled: Vec<Regex> = sources
                .iter()
                .filter_map(|s| compile_regex(platform, s))
                .collect();
            patterns.insert(field, compiled);
        }

        Ok(Self {
            platform,
            gate: Plausibility::new(raw.price_min, raw.price_max),
            pattern_price_floor: raw.pattern_price_floor,
            selectors,
            patterns,
            reviews: compile_reviews(platform, raw.reviews),
            categories: compile_categories(platform, raw.categories),
        })
    }

    pub fn probes(&self, field: Field) -> &[Probe] {
        self.selectors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn patterns_for(&self, field: Field) -> &[Regex] {
        self.patterns.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The built-in profile for `platform`, compiled on first use.
pub fn profile(platform: Platform) -> &'static MarketplaceProfile {
    static PROFILES: OnceLock<[MarketplaceProfile; 2]> = OnceLock::new();
    let profiles = PROFILES.get_or_init(|| {
        Platform::ALL.map(|p| {
            MarketplaceProfile::from_json(MARKETPLACES_JSON, p).unwrap_or_else(|e| {
                warn!(platform = %p, error = %e, "built-in marketplace profile failed to load");
                MarketplaceProfile::empty(p)
            })
        })
    });
    match platform {
        Platform::Flipkart => &profiles[0],
        Platform::Amazon => &profiles[1],
    }
}

fn parse_field(platform: Platform, key: &str) -> Option<Field> {
    match Field::from_str(key) {
        Ok(field) => Some(field),
        Err(_) => {
            warn!(%platform, key, "skipping unknown field in marketplace profile");
            None
        }
    }
}

fn compile_selector(platform: Platform, source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(%platform, selector = source, error = %e, "skipping invalid selector");
            None
        }
    }
}

fn compile_regex(platform: Platform, source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(%platform, pattern = source, error = %e, "skipping invalid pattern");
            None
        }
    }
}

fn compile_probe(platform: Platform, field: Field, raw: &RawProbe) -> Option<Probe> {
    let selector = compile_selector(platform, &raw.selector)?;
    // A probe whose regexes do not compile would yield different candidates
    // than intended, so it is dropped entirely.
    let capture = match &raw.capture {
        Some(src) => Some(compile_regex(platform, src)?),
        None => None,
    };
    let strip = match &raw.strip {
        Some(src) => Some(compile_regex(platform, src)?),
        None => None,
    };
    if capture.as_ref().is_some_and(|re| re.captures_len() < 2) {
        warn!(%platform, %field, "capture pattern has no group; probe skipped");
        return None;
    }
    Some(Probe {
        selector,
        attrs: raw.attrs.clone(),
        capture,
        strip,
        strip_query: raw.strip_query,
    })
}

fn compile_all(platform: Platform, sources: &[String]) -> Vec<Selector> {
    sources
        .iter()
        .filter_map(|s| compile_selector(platform, s))
        .collect()
}

fn compile_reviews(platform: Platform, raw: RawReviews) -> ReviewMarkers {
    ReviewMarkers {
        containers: compile_all(platform, &raw.containers),
        rating: compile_all(platform, &raw.rating),
        standalone_rating: raw.standalone_rating,
        title: compile_all(platform, &raw.title),
        body: compile_all(platform, &raw.body),
        min_len: raw.min_len.unwrap_or(40),
        max_len: raw.max_len.unwrap_or(600),
        heuristic: raw
            .heuristic
            .as_deref()
            .and_then(|s| compile_selector(platform, s)),
    }
}

fn compile_categories(platform: Platform, raw: RawCategories) -> CategoryMarkers {
    let sel = |s: Option<String>| s.as_deref().and_then(|s| compile_selector(platform, s));
    CategoryMarkers {
        rows: sel(raw.rows),
        label: sel(raw.label),
        score: sel(raw.score),
        feature_patterns: raw
            .feature_patterns
            .iter()
            .filter_map(|s| compile_regex(platform, s))
            .filter(|re| re.captures_len() >= 3)
            .collect(),
    }
}
