//! Page fetching over plain HTTP.
//!
//! Not a browser. Sends desktop Chrome headers, optionally visits the
//! marketplace home page first so the product request carries session
//! cookies, retries on 5xx / 429 / transport errors, and treats short bodies
//! as "no data" (bot walls and interstitials are small).
//!
//! Flipkart answers most non-browser clients with 403, so the Flipkart side
//! of a comparison usually comes back as "no data" from this fetcher.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use tracing::{debug, info, warn};

use pricehawk::Platform;

use crate::config::FetchConfig;
use crate::error::{ServerError, ServerResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/124.0.0.0 Safari/537.36";

/// Source of product page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Full page markup, or `None` when nothing usable came back.
    async fn fetch(&self, url: &str, platform: Platform) -> Option<String>;
}

/// Outcome of one GET.
enum Attempt {
    Page(String),
    /// Worth another try (5xx, 429, transport error, short body).
    Retry(Duration),
    /// Definitive failure (other 4xx).
    GiveUp,
}

/// reqwest-backed fetcher with a shared cookie jar.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    home_pages: HashMap<Platform, String>,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> ServerResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-IN,en-US;q=0.9,en;q=0.8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(
            "upgrade-insecure-requests",
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        let home_pages = HashMap::from([
            (Platform::Flipkart, "https://www.flipkart.com".to_string()),
            (Platform::Amazon, "https://www.amazon.in".to_string()),
        ]);

        Ok(Self {
            client,
            config,
            home_pages,
        })
    }

    /// Override the page visited to seed cookies for `platform`.
    pub fn with_home_page(mut self, platform: Platform, url: impl Into<String>) -> Self {
        self.home_pages.insert(platform, url.into());
        self
    }

    async fn seed_cookies(&self, platform: Platform) {
        let Some(home) = self.home_pages.get(&platform) else {
            return;
        };
        let seed_timeout = self.config.timeout().min(Duration::from_secs(10));
        match self.client.get(home).timeout(seed_timeout).send().await {
            Ok(resp) => debug!(%platform, status = resp.status().as_u16(), "cookie seed"),
            Err(e) => debug!(%platform, error = %e, "cookie seed failed"),
        }
    }

    async fn attempt(&self, url: &str, retry_delay: Duration) -> Attempt {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url, error = %e, "request failed");
                return Attempt::Retry(retry_delay);
            }
        };

        let status = resp.status().as_u16();
        if status == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.min(10)))
                .unwrap_or(retry_delay);
            warn!(url, "rate limited");
            return Attempt::Retry(retry_after);
        }
        if status >= 500 {
            warn!(url, status, "server error");
            return Attempt::Retry(retry_delay);
        }
        if status != 200 {
            warn!(url, status, "unexpected status");
            return Attempt::GiveUp;
        }

        match resp.text().await {
            Ok(body) => {
                let chars = body.chars().count();
                if chars < self.config.min_page_chars {
                    warn!(url, chars, "page too short; likely a bot wall");
                    Attempt::Retry(retry_delay)
                } else {
                    Attempt::Page(body)
                }
            }
            Err(e) => {
                warn!(url, error = %e, "failed to read body");
                Attempt::Retry(retry_delay)
            }
        }
    }

    /// Fetch with retries, returning an error describing the last failure.
    pub async fn fetch_page(&self, url: &str, platform: Platform) -> ServerResult<String> {
        let attempts = self.config.attempts.max(1);
        for n in 1..=attempts {
            if self.config.seed_cookies {
                self.seed_cookies(platform).await;
            }
            let backoff = Duration::from_millis(self.config.retry_delay_ms * 2u64.pow(n - 1));
            match self.attempt(url, backoff).await {
                Attempt::Page(body) => {
                    info!(%platform, chars = body.len(), attempt = n, "page fetched");
                    return Ok(body);
                }
                Attempt::GiveUp => break,
                Attempt::Retry(delay) => {
                    if n < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(ServerError::Fetch(format!("no usable page from {url}")))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, platform: Platform) -> Option<String> {
        match self.fetch_page(url, platform).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%platform, error = %e, "fetch gave up");
                None
            }
        }
    }
}
