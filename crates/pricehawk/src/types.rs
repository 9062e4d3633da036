//! Core data types for product records, scores, and comparisons.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Marketplace that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Flipkart,
    Amazon,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Flipkart, Platform::Amazon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Flipkart => "flipkart",
            Platform::Amazon => "amazon",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PricehawkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flipkart" => Ok(Platform::Flipkart),
            "amazon" => Ok(Platform::Amazon),
            other => Err(PricehawkError::UnknownPlatform(other.to_string())),
        }
    }
}

/// A product field resolved by the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Price,
    Image,
    Rating,
    Brand,
    Ram,
    Storage,
    Processor,
    Camera,
    Battery,
    Display,
}

impl Field {
    /// Every field, in resolution order.
    pub const ALL: [Field; 11] = [
        Field::Title,
        Field::Price,
        Field::Image,
        Field::Rating,
        Field::Brand,
        Field::Ram,
        Field::Storage,
        Field::Processor,
        Field::Camera,
        Field::Battery,
        Field::Display,
    ];

    /// The six specification fields counted by the specs score.
    pub const SPECS: [Field; 6] = [
        Field::Ram,
        Field::Storage,
        Field::Processor,
        Field::Camera,
        Field::Battery,
        Field::Display,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Image => "image",
            Field::Rating => "rating",
            Field::Brand => "brand",
            Field::Ram => "ram",
            Field::Storage => "storage",
            Field::Processor => "processor",
            Field::Camera => "camera",
            Field::Battery => "battery",
            Field::Display => "display",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = PricehawkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| PricehawkError::InvalidInput(format!("unknown field: {s}")))
    }
}

/// A value that passed its field's plausibility predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Rating(f64),
}

/// A single harvested customer review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub text: String,
}

/// Insertion-ordered mapping of category name to a 1–5 rating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryRatings {
    entries: Vec<(String, f64)>,
}

impl CategoryRatings {
    pub const MAX_ENTRIES: usize = 6;

    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rating. Rejects duplicates, out-of-range scores, and entries
    /// beyond the cap.
    pub fn insert(&mut self, name: &str, score: f64) -> bool {
        let name = name.trim();
        if name.is_empty()
            || !(1.0..=5.0).contains(&score)
            || self.is_full()
            || self.get(name).is_some()
        {
            return false;
        }
        self.entries.push((name.to_string(), score));
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= Self::MAX_ENTRIES
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|(_, v)| v).sum();
        Some(sum / self.entries.len() as f64)
    }
}

impl Serialize for CategoryRatings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, score) in &self.entries {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

/// Recommendation label derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Highly Recommended")]
    HighlyRecommended,
    #[serde(rename = "Recommended")]
    Recommended,
    #[serde(rename = "Worth Considering")]
    WorthConsidering,
    #[serde(rename = "Proceed with Caution")]
    ProceedWithCaution,
    #[serde(rename = "Not Recommended")]
    NotRecommended,
}

impl Verdict {
    pub fn from_total(total: u8) -> Self {
        match total {
            85..=u8::MAX => Verdict::HighlyRecommended,
            72..=84 => Verdict::Recommended,
            58..=71 => Verdict::WorthConsidering,
            42..=57 => Verdict::ProceedWithCaution,
            _ => Verdict::NotRecommended,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::HighlyRecommended => "Highly Recommended",
            Verdict::Recommended => "Recommended",
            Verdict::WorthConsidering => "Worth Considering",
            Verdict::ProceedWithCaution => "Proceed with Caution",
            Verdict::NotRecommended => "Not Recommended",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-component contributions to the total score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub rating_score: f64,
    pub sentiment_score: f64,
    pub category_score: f64,
    pub specs_score: f64,
}

impl Breakdown {
    pub fn sum(&self) -> f64 {
        self.rating_score + self.sentiment_score + self.category_score + self.specs_score
    }
}

/// Derived recommendation score for a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub total: u8,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub breakdown: Breakdown,
}

/// Normalized product data extracted from one marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub platform: Platform,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    pub category_ratings: CategoryRatings,
    pub reviews: Vec<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl ProductRecord {
    /// Create an empty record for a listing.
    pub fn new(platform: Platform, source_url: impl Into<String>) -> Self {
        Self {
            platform,
            source_url: source_url.into(),
            title: None,
            price: None,
            brand: None,
            image: None,
            rating: None,
            ram: None,
            storage: None,
            processor: None,
            camera: None,
            battery: None,
            display: None,
            category_ratings: CategoryRatings::new(),
            reviews: Vec::new(),
            score: None,
        }
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Price => Some(&mut self.price),
            Field::Image => Some(&mut self.image),
            Field::Brand => Some(&mut self.brand),
            Field::Ram => Some(&mut self.ram),
            Field::Storage => Some(&mut self.storage),
            Field::Processor => Some(&mut self.processor),
            Field::Camera => Some(&mut self.camera),
            Field::Battery => Some(&mut self.battery),
            Field::Display => Some(&mut self.display),
            Field::Rating => None,
        }
    }

    /// Text value of a field, if populated.
    pub fn text(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::Title => &self.title,
            Field::Price => &self.price,
            Field::Image => &self.image,
            Field::Brand => &self.brand,
            Field::Ram => &self.ram,
            Field::Storage => &self.storage,
            Field::Processor => &self.processor,
            Field::Camera => &self.camera,
            Field::Battery => &self.battery,
            Field::Display => &self.display,
            Field::Rating => return None,
        };
        slot.as_deref()
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Rating => self.rating.is_some(),
            other => self.text(other).is_some(),
        }
    }

    /// Store a resolved value. Already-populated fields are never overwritten.
    pub fn set(&mut self, field: Field, value: FieldValue) -> bool {
        if self.has(field) {
            return false;
        }
        match (field, value) {
            (Field::Rating, FieldValue::Rating(r)) => {
                self.rating = Some(r);
                true
            }
            (field, FieldValue::Text(text)) => match self.text_slot(field) {
                Some(slot) => {
                    *slot = Some(text);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Number of populated specification fields.
    pub fn specs_present(&self) -> usize {
        Field::SPECS.iter().filter(|f| self.has(**f)).count()
    }

    /// A record with neither title nor price carries no usable data.
    pub fn is_usable(&self) -> bool {
        self.title.is_some() || self.price.is_some()
    }

    pub fn total_score(&self) -> u8 {
        self.score.as_ref().map(|s| s.total).unwrap_or(0)
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Flipkart,
    Amazon,
    Tie,
    #[serde(rename = "none")]
    NoResult,
}

impl From<Platform> for Winner {
    fn from(p: Platform) -> Self {
        match p {
            Platform::Flipkart => Winner::Flipkart,
            Platform::Amazon => Winner::Amazon,
        }
    }
}

/// Price gap between the two sides of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDifference {
    pub amount: f64,
    pub cheaper_on: Platform,
    pub percentage: f64,
}

/// Result of comparing up to one record per marketplace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub flipkart: Option<ProductRecord>,
    pub amazon: Option<ProductRecord>,
    pub winner: Winner,
    pub price_difference: Option<PriceDifference>,
}

/// Errors raised at the library's fallible boundaries.
#[derive(thiserror::Error, Debug)]
pub enum PricehawkError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid marketplace profile: {0}")]
    Profile(String),
}

/// Convenience result type.
pub type PricehawkResult<T> = Result<T, PricehawkError>;
