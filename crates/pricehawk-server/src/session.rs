//! Comparison sessions: fetch both marketplaces, analyze, persist, compare.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use pricehawk::{
    analyze_page, canonicalize, compare, ComparisonResult, Platform, ProductRecord, ProductStore,
};

use crate::error::{ServerError, ServerResult};
use crate::fetch::PageFetcher;

/// What a comparison returns to CLI and HTTP callers.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub comparison_id: String,
    pub status: &'static str,
    #[serde(flatten)]
    pub result: ComparisonResult,
    /// Product ids written to the store, in Flipkart, Amazon order.
    pub saved: Vec<String>,
}

/// Runs comparisons against an injected fetcher and optional store.
#[derive(Clone)]
pub struct ComparisonSession {
    fetcher: Arc<dyn PageFetcher>,
    store: Option<Arc<dyn ProductStore>>,
    stagger: Duration,
}

struct SideOutcome {
    record: Option<ProductRecord>,
    saved: Option<String>,
}

impl ComparisonSession {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Option<Arc<dyn ProductStore>>) -> Self {
        Self {
            fetcher,
            store,
            stagger: Duration::ZERO,
        }
    }

    /// Delay the Amazon fetch by `stagger` when both sides are requested.
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Compare one or two product URLs.
    ///
    /// Blank URLs count as missing; at least one must be present. A side that
    /// fails to fetch or yields nothing usable is absent from the result.
    pub async fn compare(
        &self,
        flipkart_url: Option<&str>,
        amazon_url: Option<&str>,
    ) -> ServerResult<ComparisonReport> {
        let flipkart_url = non_blank(flipkart_url).map(|u| canonicalize(u, Platform::Flipkart));
        let amazon_url = non_blank(amazon_url).map(|u| canonicalize(u, Platform::Amazon));
        if flipkart_url.is_none() && amazon_url.is_none() {
            return Err(ServerError::InvalidRequest(
                "Provide at least one product URL".to_string(),
            ));
        }

        let comparison_id = uuid::Uuid::new_v4().to_string();
        let stagger = if flipkart_url.is_some() && amazon_url.is_some() {
            self.stagger
        } else {
            Duration::ZERO
        };
        info!(%comparison_id, "comparison started");

        let (flipkart, amazon) = tokio::join!(
            self.run_side(Platform::Flipkart, flipkart_url, &comparison_id, Duration::ZERO),
            self.run_side(Platform::Amazon, amazon_url, &comparison_id, stagger),
        );

        let saved = [&flipkart.saved, &amazon.saved]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        let result = compare(flipkart.record, amazon.record);
        info!(%comparison_id, winner = ?result.winner, "comparison finished");

        Ok(ComparisonReport {
            comparison_id,
            status: "success",
            result,
            saved,
        })
    }

    async fn run_side(
        &self,
        platform: Platform,
        url: Option<String>,
        comparison_id: &str,
        delay: Duration,
    ) -> SideOutcome {
        let empty = SideOutcome {
            record: None,
            saved: None,
        };
        let Some(url) = url else {
            return empty;
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let Some(html) = self.fetcher.fetch(&url, platform).await else {
            warn!(%platform, url = %url, "no page data");
            return empty;
        };

        let store = self.store.clone();
        let comparison_id = comparison_id.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            let record = analyze_page(&html, platform, &url);
            let saved = match (&record, &store) {
                (Some(record), Some(store)) => match store.save(record, Some(&comparison_id)) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!(%platform, error = %e, "failed to persist product");
                        None
                    }
                },
                _ => None,
            };
            SideOutcome { record, saved }
        })
        .await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%platform, error = %e, "analysis task failed");
                return empty;
            }
        };

        match &outcome.record {
            Some(record) => info!(
                %platform,
                score = record.total_score(),
                reviews = record.reviews.len(),
                "side analyzed"
            ),
            None => info!(%platform, "page had no usable product"),
        }
        outcome
    }
}

fn non_blank(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| !u.is_empty())
}
