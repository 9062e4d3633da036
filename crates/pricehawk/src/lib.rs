//! PriceHawk — marketplace product extraction, scoring, and comparison.

pub mod analyze;
pub mod canonical;
pub mod categories;
pub mod comparison;
pub mod extraction;
pub mod marketplace;
pub mod plausibility;
pub mod reviews;
pub mod scoring;
pub mod store;
pub mod text;
pub mod types;

pub use analyze::{analyze_page, analyze_with_profile};
pub use canonical::{canonicalize, detect_platform};
pub use categories::aggregate_categories;
pub use comparison::{compare, decide_winner, price_difference, TIE_THRESHOLD};
pub use extraction::{ExtractionStrategy, FieldResolver, Page};
pub use marketplace::{profile, MarketplaceProfile};
pub use plausibility::Plausibility;
pub use reviews::harvest_reviews;
pub use scoring::{apply_score, score};
pub use store::{product_id, review_rows, MemoryStore, PersistedProduct, ProductStore, ReviewRow};
pub use types::*;
