//! SQLite persistence for scored products and their reviews.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use pricehawk::{
    product_id, review_rows, PersistedProduct, PricehawkError, PricehawkResult, ProductRecord,
    ProductStore,
};

use crate::error::{ServerError, ServerResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id               TEXT PRIMARY KEY,
    comparison_id    TEXT,
    platform         TEXT NOT NULL,
    url              TEXT NOT NULL,
    title            TEXT,
    price            TEXT,
    brand            TEXT,
    image            TEXT,
    rating           REAL,
    ram              TEXT,
    storage          TEXT,
    processor        TEXT,
    camera           TEXT,
    battery          TEXT,
    display          TEXT,
    category_ratings TEXT NOT NULL DEFAULT '{}',
    score            INTEGER,
    verdict          TEXT,
    reasons          TEXT NOT NULL DEFAULT '[]',
    breakdown        TEXT NOT NULL DEFAULT '{}',
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_products_created ON products(created_at);

CREATE TABLE IF NOT EXISTS reviews (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id  TEXT NOT NULL,
    rating      INTEGER NOT NULL,
    text        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews(product_id);
";

/// Upper bound on rows returned by [`SqliteStore::recent`].
pub const MAX_RECENT: usize = 500;

/// A stored product with its JSON columns decoded, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardProduct {
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
    pub category_ratings: Value,
    pub score: Option<u8>,
    pub verdict: Option<String>,
    pub reasons: Vec<String>,
    pub breakdown: Value,
    pub created_at: String,
}

/// SQLite-backed [`ProductStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating parent directories and tables as needed).
    pub fn open(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> ServerResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ServerResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> ServerResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ServerError::Storage(format!("connection mutex poisoned: {e}")))
    }

    fn insert(&self, row: &PersistedProduct, record: &ProductRecord) -> ServerResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO products (
                id, comparison_id, platform, url, title, price, brand, image, rating,
                ram, storage, processor, camera, battery, display,
                category_ratings, score, verdict, reasons, breakdown, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19, ?20, ?21)
             ON CONFLICT(id) DO UPDATE SET
                comparison_id = excluded.comparison_id,
                platform = excluded.platform,
                url = excluded.url,
                title = excluded.title,
                price = excluded.price,
                brand = excluded.brand,
                image = excluded.image,
                rating = excluded.rating,
                ram = excluded.ram,
                storage = excluded.storage,
                processor = excluded.processor,
                camera = excluded.camera,
                battery = excluded.battery,
                display = excluded.display,
                category_ratings = excluded.category_ratings,
                score = excluded.score,
                verdict = excluded.verdict,
                reasons = excluded.reasons,
                breakdown = excluded.breakdown,
                created_at = excluded.created_at",
            params![
                row.id,
                row.comparison_id,
                row.platform,
                row.url,
                row.title,
                row.price,
                row.brand,
                row.image,
                row.rating,
                row.ram,
                row.storage,
                row.processor,
                row.camera,
                row.battery,
                row.display,
                row.category_ratings,
                row.score,
                row.verdict,
                row.reasons,
                row.breakdown,
                now,
            ],
        )?;
        for review in review_rows(&row.id, &record.reviews) {
            tx.execute(
                "INSERT INTO reviews (product_id, rating, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![review.product_id, review.rating, review.text, now],
            )?;
        }
        tx.commit()?;
        debug!(id = %row.id, reviews = record.reviews.len(), "product saved");
        Ok(())
    }

    /// Latest products first, at most [`MAX_RECENT`].
    pub fn recent(&self, limit: usize) -> ServerResult<Vec<DashboardProduct>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit.min(MAX_RECENT) as i64], dashboard_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up one product by its canonical URL.
    pub fn find_by_url(&self, canonical_url: &str) -> ServerResult<Option<DashboardProduct>> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM products WHERE id = ?1"),
                params![product_id(canonical_url)],
                dashboard_row,
            )
            .optional()?;
        Ok(found)
    }

    pub fn review_count(&self, product_id: &str) -> ServerResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reviews WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

const COLUMNS: &str = "id, comparison_id, platform, url, title, price, brand, image, rating, \
     ram, storage, processor, camera, battery, display, \
     category_ratings, score, verdict, reasons, breakdown, created_at";

fn dashboard_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DashboardProduct> {
    let category_ratings: String = row.get(15)?;
    let reasons: String = row.get(18)?;
    let breakdown: String = row.get(19)?;
    Ok(DashboardProduct {
        id: row.get(0)?,
        comparison_id: row.get(1)?,
        platform: row.get(2)?,
        url: row.get(3)?,
        title: row.get(4)?,
        price: row.get(5)?,
        brand: row.get(6)?,
        image: row.get(7)?,
        rating: row.get(8)?,
        ram: row.get(9)?,
        storage: row.get(10)?,
        processor: row.get(11)?,
        camera: row.get(12)?,
        battery: row.get(13)?,
        display: row.get(14)?,
        category_ratings: decode_object(&category_ratings),
        score: row.get(16)?,
        verdict: row.get(17)?,
        reasons: serde_json::from_str(&reasons).unwrap_or_default(),
        breakdown: decode_object(&breakdown),
        created_at: row.get(20)?,
    })
}

/// Malformed JSON columns decode to an empty object.
fn decode_object(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => v,
        _ => Value::Object(Default::default()),
    }
}

impl ProductStore for SqliteStore {
    fn save(&self, record: &ProductRecord, comparison_id: Option<&str>) -> PricehawkResult<String> {
        let row = PersistedProduct::from_record(record, comparison_id)?;
        self.insert(&row, record)
            .map_err(|e| PricehawkError::Storage(e.to_string()))?;
        Ok(row.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricehawk::{apply_score, Platform, Review};

    fn record(url: &str, title: &str) -> ProductRecord {
        let mut r = ProductRecord::new(Platform::Amazon, url);
        r.title = Some(title.into());
        r.price = Some("₹18,999".into());
        r.rating = Some(4.4);
        r.category_ratings.insert("Battery life", 4.6);
        r.reviews = vec![
            Review {
                rating: 5,
                text: "Battery lasts forever".into(),
            },
            Review {
                rating: 3,
                text: "Camera is average".into(),
            },
        ];
        apply_score(&mut r);
        r
    }

    #[test]
    fn test_save_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested/pricehawk.db")).unwrap();
        let r = record("https://www.amazon.in/x/dp/B0CX23V2ZK", "Phone X");
        let id = store.save(&r, Some("cmp-1")).unwrap();
        assert_eq!(id, product_id(&r.source_url));

        let rows = store.recent(50).unwrap();
        assert_eq!(rows.len(), 1);
        let p = &rows[0];
        assert_eq!(p.title.as_deref(), Some("Phone X"));
        assert_eq!(p.comparison_id.as_deref(), Some("cmp-1"));
        assert_eq!(p.category_ratings["Battery life"], 4.6);
        assert_eq!(p.score, r.score.as_ref().map(|s| s.total));
        assert_eq!(p.reasons, r.score.as_ref().unwrap().reasons);
        assert_eq!(store.review_count(&id).unwrap(), 2);
    }

    #[test]
    fn test_upsert_keeps_one_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let url = "https://www.amazon.in/x/dp/B0CX23V2ZK";
        store.save(&record(url, "Old"), None).unwrap();
        store.save(&record(url, "New"), Some("cmp-2")).unwrap();
        let rows = store.recent(50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("New"));
        assert_eq!(store.review_count(&rows[0].id).unwrap(), 4);
        assert!(store.find_by_url(url).unwrap().is_some());
        assert!(store
            .find_by_url("https://www.amazon.in/y/dp/B000000000")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_recent_limit_and_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            let url = format!("https://www.amazon.in/x/dp/B00000000{i}");
            store.save(&record(&url, &format!("Phone {i}")), None).unwrap();
        }
        let rows = store.recent(3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title.as_deref(), Some("Phone 4"));
    }

    #[test]
    fn test_recent_limit_is_capped() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..MAX_RECENT + 1 {
            let url = format!("https://www.amazon.in/x/dp/B{i:09}");
            store.save(&record(&url, "Phone"), None).unwrap();
        }
        assert_eq!(store.recent(usize::MAX).unwrap().len(), MAX_RECENT);
    }

    #[test]
    fn test_malformed_json_columns() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO products (id, platform, url, category_ratings, reasons, breakdown, created_at)
                 VALUES ('x', 'amazon', 'u', 'oops', 'nope', '[1]', '2026-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        let rows = store.recent(10).unwrap();
        assert_eq!(rows[0].category_ratings, serde_json::json!({}));
        assert!(rows[0].reasons.is_empty());
        assert_eq!(rows[0].breakdown, serde_json::json!({}));
    }
}
