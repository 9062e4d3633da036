//! Persistence seam.
//!
//! The core never talks to a database directly. Callers inject a
//! [`ProductStore`]; the companion server ships a SQLite one and
//! [`MemoryStore`] serves tests and dry runs.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{PricehawkError, PricehawkResult, ProductRecord, Review};

const ID_HEX_CHARS: usize = 20;

/// Stable product id: the first 20 hex characters of SHA-256(canonical URL).
pub fn product_id(canonical_url: &str) -> String {
    Sha256::digest(canonical_url.as_bytes())
        .iter()
        .take(ID_HEX_CHARS / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Flattened record as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProduct {
    pub id: String,
    pub comparison_id: Option<String>,
    pub platform: String,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub processor: Option<String>,
    pub camera: Option<String>,
    pub battery: Option<String>,
    pub display: Option<String>,
    /// JSON object, insertion ordered.
    pub category_ratings: String,
    pub score: Option<u8>,
    pub verdict: Option<String>,
    /// JSON array.
    pub reasons: String,
    /// JSON object.
    pub breakdown: String,
}

impl PersistedProduct {
    pub fn from_record(record: &ProductRecord, comparison_id: Option<&str>) -> PricehawkResult<Self> {
        let score = record.score.as_ref();
        Ok(Self {
            id: product_id(&record.source_url),
            comparison_id: comparison_id.map(str::to_string),
            platform: record.platform.as_str().to_string(),
            url: record.source_url.clone(),
            title: record.title.clone(),
            price: record.price.clone(),
            brand: record.brand.clone(),
            image: record.image.clone(),
            rating: record.rating,
            ram: record.ram.clone(),
            storage: record.storage.clone(),
            processor: record.processor.clone(),
            camera: record.camera.clone(),
            battery: record.battery.clone(),
            display: record.display.clone(),
            category_ratings: serde_json::to_string(&record.category_ratings)?,
            score: score.map(|s| s.total),
            verdict: score.map(|s| s.verdict.label().to_string()),
            reasons: serde_json::to_string(&score.map(|s| s.reasons.as_slice()).unwrap_or(&[]))?,
            breakdown: serde_json::to_string(&score.map(|s| s.breakdown).unwrap_or_default())?,
        })
    }
}

/// One review row linked to a product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub product_id: String,
    pub rating: u8,
    pub text: String,
}

pub fn review_rows(product_id: &str, reviews: &[Review]) -> Vec<ReviewRow> {
    reviews
        .iter()
        .map(|r| ReviewRow {
            product_id: product_id.to_string(),
            rating: r.rating,
            text: r.text.clone(),
        })
        .collect()
}

/// Destination for scored records.
pub trait ProductStore: Send + Sync {
    /// Upsert a record (keyed by its product id) and append its reviews.
    /// Returns the product id.
    fn save(&self, record: &ProductRecord, comparison_id: Option<&str>) -> PricehawkResult<String>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    products: Vec<PersistedProduct>,
    reviews: Vec<ReviewRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> Vec<PersistedProduct> {
        self.inner
            .lock()
            .map(|g| g.products.clone())
            .unwrap_or_default()
    }

    pub fn reviews(&self) -> Vec<ReviewRow> {
        self.inner
            .lock()
            .map(|g| g.reviews.clone())
            .unwrap_or_default()
    }
}

impl ProductStore for MemoryStore {
    fn save(&self, record: &ProductRecord, comparison_id: Option<&str>) -> PricehawkResult<String> {
        let row = PersistedProduct::from_record(record, comparison_id)?;
        let id = row.id.clone();
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| PricehawkError::Storage(format!("memory store poisoned: {e}")))?;
        match inner.products.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = row,
            None => inner.products.push(row),
        }
        let rows = review_rows(&id, &record.reviews);
        inner.reviews.extend(rows);
        Ok(id)
    }
}
