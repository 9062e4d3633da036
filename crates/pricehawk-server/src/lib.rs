//! PriceHawk server — fetching, persistence, and the CLI/HTTP surfaces around the core.

#[cfg(feature = "http")]
pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod session;
pub mod storage;

pub use config::{resolve_db_path, FetchConfig};
pub use error::{ServerError, ServerResult};
pub use fetch::{HttpFetcher, PageFetcher};
pub use session::{ComparisonReport, ComparisonSession};
pub use storage::{DashboardProduct, SqliteStore};
