//! Canonical product URLs with tracking parameters removed.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::Platform;

fn flipkart_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://(?:www|m)\.flipkart\.com/[^?#]+/p/[a-zA-Z0-9]+")
            .expect("flipkart url regex is valid")
    })
}

fn amazon_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://www\.amazon\.[a-z.]+/[^?#]*/dp/[A-Z0-9]{10}")
            .expect("amazon url regex is valid")
    })
}

/// Shortest prefix of `url` that still identifies the product.
///
/// Flipkart item ids are mixed-case (`itmb07d67f995271`, `MOBH4DQ`); Amazon
/// ids are ten-character ASINs. Unrecognised URLs are returned unchanged.
pub fn canonicalize(url: &str, platform: Platform) -> String {
    let url = url.trim();
    let pattern = match platform {
        Platform::Flipkart => flipkart_pattern(),
        Platform::Amazon => amazon_pattern(),
    };
    pattern
        .find(url)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| url.to_string())
}

/// Guess the marketplace from a URL's host.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let host = url::Url::parse(url.trim()).ok()?.host_str()?.to_ascii_lowercase();
    if host.ends_with("flipkart.com") {
        Some(Platform::Flipkart)
    } else if host.contains("amazon.") {
        Some(Platform::Amazon)
    } else {
        None
    }
}
