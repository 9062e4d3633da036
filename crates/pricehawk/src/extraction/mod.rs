//! Field extraction: three strategies run as an ordered cascade.
//!
//! All entry points are synchronous. `scraper`'s document type is `!Send`,
//! so async callers should run extraction inside
//! `tokio::task::spawn_blocking`.

pub mod pattern;
pub mod pipeline;
pub mod selector;
pub mod structured;

use scraper::Html;
use serde_json::Value;

pub use pattern::PatternScan;
pub use pipeline::{ExtractionStrategy, FieldResolver};
pub use selector::SelectorTable;
pub use structured::StructuredData;

/// A fetched page, parsed once and shared by every strategy.
pub struct Page<'a> {
    /// The unparsed markup, scanned by raw-text patterns.
    pub raw: &'a str,
    pub document: Html,
    /// JSON-LD objects typed `Product`, in document order.
    pub products: Vec<Value>,
}

impl<'a> Page<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let document = Html::parse_document(raw);
        let products = structured::product_islands(&document);
        Self {
            raw,
            document,
            products,
        }
    }
}
