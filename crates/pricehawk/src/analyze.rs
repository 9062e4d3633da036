//! One page in, one scored record out.

use tracing::debug;

use crate::canonical::canonicalize;
use crate::categories::aggregate_categories;
use crate::extraction::{FieldResolver, Page};
use crate::marketplace::{profile, MarketplaceProfile};
use crate::reviews::harvest_reviews;
use crate::scoring::apply_score;
use crate::types::{Platform, ProductRecord};

/// Extract, enrich, and score a product page with the built-in profile.
///
/// Returns `None` when the page yields neither a title nor a price.
pub fn analyze_page(html: &str, platform: Platform, url: &str) -> Option<ProductRecord> {
    analyze_with_profile(html, profile(platform), url)
}

pub fn analyze_with_profile(
    html: &str,
    profile: &MarketplaceProfile,
    url: &str,
) -> Option<ProductRecord> {
    let page = Page::parse(html);
    let mut record = ProductRecord::new(profile.platform, canonicalize(url, profile.platform));

    FieldResolver::for_profile(profile).resolve_into(&page, &mut record);
    if !record.is_usable() {
        debug!(platform = %profile.platform, url, "no title or price; record dropped");
        return None;
    }

    record.reviews = harvest_reviews(&page, &profile.reviews);
    record.category_ratings = aggregate_categories(&page, &profile.categories);
    apply_score(&mut record);
    debug!(
        platform = %record.platform,
        reviews = record.reviews.len(),
        categories = record.category_ratings.len(),
        score = record.total_score(),
        "page analyzed"
    );
    Some(record)
}
