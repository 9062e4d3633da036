//! End-to-end integration tests for the pricehawk core.
//!
//! Whole product pages go in; scored, compared records come out.

use pricehawk::*;

// ─────────────────────── fixtures ───────────────────────

const FLIPKART_URL: &str =
    "https://www.flipkart.com/phone-x-blue-128-gb/p/itmb07d67f995271?pid=MOBH4DQ&lid=LSTMOB&marketplace=FLIPKART";

const AMAZON_URL: &str =
    "https://www.amazon.in/Acme-Phone-Midnight-128GB-Storage/dp/B0CX23V2ZK/ref=sr_1_1?crid=2M&keywords=acme";

/// JSON-LD island plus disagreeing markup further down.
const FLIPKART_PAGE: &str = r#"<!doctype html>
<html><head>
<title>Phone Z - Buy Online at Best Price | Flipkart</title>
<meta property="og:title" content="Phone Z (Green) - Buy Online | Flipkart">
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Product",
  "name": "Phone X",
  "image": "https://rukminim2.flixcart.com/image/416/416/phone-x.jpeg",
  "brand": {"@type": "Brand", "name": "Acme"},
  "offers": {"@type": "Offer", "price": 18999, "priceCurrency": "INR"},
  "aggregateRating": {"@type": "AggregateRating", "ratingValue": 4.6, "reviewCount": 2310}
}
</script>
</head><body>
<div class="Nx9bqj">₹21,999</div>
<div class="XQDdHH">3.9</div>
<ul>
  <li>8 GB RAM | 128 GB ROM</li>
  <li>50MP Rear Camera | 16MP Front Camera</li>
  <li>5000 mAh Battery</li>
</ul>
<div class="_2x1Yo4">Camera 4.5</div>
<div class="_2x1Yo4">Battery 4.7</div>
</body></html>"#;

const AMAZON_PAGE: &str = r#"<!doctype html>
<html><head><title>Acme Phone Y : Amazon.in: Electronics</title></head><body>
<span id="productTitle">
    Acme Phone Y (Midnight, 8GB RAM, 128GB Storage)
</span>
<a id="bylineInfo" href="/stores/Acme">Brand: Acme</a>
<span id="acrPopover" title="4.2 out of 5 stars"><span class="a-icon-alt">4.2 out of 5 stars</span></span>
<span class="a-price"><span class="a-offscreen">₹17,499.00</span><span class="a-price-whole">17,499.</span></span>
<div id="imgTagWrapperId">
  <img id="landingImage"
       data-old-hires="https://m.media-amazon.com/images/I/61yPhone._SL1500_.jpg"
       src="https://m.media-amazon.com/images/I/61yPhone._SX300_.jpg">
</div>
<div id="feature-bullets"><ul>
  <li><span class="a-list-item">8 GB RAM, 128 GB Storage</span></li>
  <li><span class="a-list-item">50MP Main Camera with OIS</span></li>
  <li><span class="a-list-item">6.7 inch Super AMOLED display, 120Hz</span></li>
  <li><span class="a-list-item">5000 mAh battery with 45W charging</span></li>
  <li><span class="a-list-item">Snapdragon 6 Gen 1 Processor</span></li>
</ul></div>
<div data-hook="cr-summarization-attribute">
  <span class="a-size-base">Battery life</span>
  <i><span class="a-icon-alt">4.5 out of 5 stars</span></i>
</div>
<div data-hook="cr-summarization-attribute">
  <span class="a-size-base">Camera</span>
  <i><span class="a-icon-alt">4.0 out of 5 stars</span></i>
</div>
<div data-hook="review">
  <i class="review-rating"><span class="a-icon-alt">5.0 out of 5 stars</span></i>
  <a data-hook="review-title"><span>Superb battery</span></a>
  <span data-hook="review-body"><span>Lasts two days with moderate use and charging is quick.</span></span>
</div>
<div data-hook="review">
  <i class="review-rating"><span class="a-icon-alt">4.0 out of 5 stars</span></i>
  <a data-hook="review-title"><span>Good camera</span></a>
  <span data-hook="review-body"><span>Daylight shots are crisp, night mode is a little slow.</span></span>
</div>
<div data-hook="review">
  <i class="review-rating"><span class="a-icon-alt">5.0 out of 5 stars</span></i>
  <a data-hook="review-title"><span>Value for money</span></a>
  <span data-hook="review-body"><span>Nothing else at this price has a display this good.</span></span>
</div>
</body></html>"#;

const BLOCKED_PAGE: &str = r#"<html><body><p>Access denied. Please try again later.</p></body></html>"#;

// ─────────────────────── tests ───────────────────────

#[test]
fn flipkart_structured_page() {
    let record = analyze_page(FLIPKART_PAGE, Platform::Flipkart, FLIPKART_URL).unwrap();

    assert_eq!(
        record.source_url,
        "https://www.flipkart.com/phone-x-blue-128-gb/p/itmb07d67f995271"
    );
    // Structured data wins over the disagreeing meta tag, price div, and badge.
    assert_eq!(record.title.as_deref(), Some("Phone X"));
    assert_eq!(record.price.as_deref(), Some("₹18,999"));
    assert_eq!(record.rating, Some(4.6));
    assert_eq!(record.brand.as_deref(), Some("Acme"));
    assert_eq!(
        record.image.as_deref(),
        Some("https://rukminim2.flixcart.com/image/416/416/phone-x.jpeg")
    );

    // Specs come from the raw-text patterns.
    assert_eq!(record.ram.as_deref(), Some("8 GB"));
    assert_eq!(record.storage.as_deref(), Some("128 GB"));
    assert_eq!(record.camera.as_deref(), Some("50MP Rear Camera"));
    assert_eq!(record.battery.as_deref(), Some("5000 mAh"));
    assert_eq!(record.specs_present(), 4);

    assert_eq!(record.category_ratings.get("Camera"), Some(4.5));
    assert_eq!(record.category_ratings.get("Battery"), Some(4.7));

    let score = record.score.as_ref().unwrap();
    assert_eq!(score.breakdown.rating_score, 40.0);
    assert_eq!(score.reasons[0], "Exceptional 4.6/5 customer rating");
}

#[test]
fn amazon_markup_page() {
    let record = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL).unwrap();

    assert_eq!(
        record.source_url,
        "https://www.amazon.in/Acme-Phone-Midnight-128GB-Storage/dp/B0CX23V2ZK"
    );
    assert_eq!(
        record.title.as_deref(),
        Some("Acme Phone Y (Midnight, 8GB RAM, 128GB Storage)")
    );
    assert_eq!(record.price.as_deref(), Some("₹17,499"));
    assert_eq!(
        record.image.as_deref(),
        Some("https://m.media-amazon.com/images/I/61yPhone._SL1500_.jpg")
    );
    assert_eq!(record.rating, Some(4.2));
    assert_eq!(record.brand.as_deref(), Some("Acme"));
    assert_eq!(record.ram.as_deref(), Some("8 GB"));
    assert_eq!(record.storage.as_deref(), Some("128 GB"));
    assert_eq!(record.camera.as_deref(), Some("50MP Main Camera"));
    assert_eq!(record.display.as_deref(), Some("6.7 inch"));
    assert_eq!(record.battery.as_deref(), Some("5000 mAh"));
    assert_eq!(record.processor.as_deref(), Some("Snapdragon 6 Gen 1"));

    assert_eq!(record.reviews.len(), 3);
    assert_eq!(record.reviews[0].rating, 5);
    assert_eq!(
        record.reviews[0].text,
        "Superb battery — Lasts two days with moderate use and charging is quick."
    );
    assert_eq!(record.reviews[1].rating, 4);

    let cats: Vec<_> = record.category_ratings.iter().collect();
    assert_eq!(cats, vec![("Battery life", 4.5), ("Camera", 4.0)]);

    let score = record.score.as_ref().unwrap();
    assert_eq!(score.breakdown.rating_score, 33.0);
    assert_eq!(score.breakdown.sentiment_score, 30.0);
    assert_eq!(score.breakdown.category_score, 17.0);
    assert_eq!(score.breakdown.specs_score, 10.0);
    assert_eq!(score.total, 90);
    assert_eq!(score.verdict, Verdict::HighlyRecommended);
    assert_eq!(
        score.reasons,
        vec![
            "Excellent 4.2/5 customer rating",
            "100% of reviews are positive",
            "Outstanding Battery life performance",
            "Detailed specifications available (6/6)",
        ]
    );
}

#[test]
fn blocked_page_yields_no_record() {
    for platform in Platform::ALL {
        assert!(analyze_page(BLOCKED_PAGE, platform, "https://example.com").is_none());
    }
    assert!(analyze_page("", Platform::Amazon, "").is_none());
}

#[test]
fn compare_both_sides() {
    let fk = analyze_page(FLIPKART_PAGE, Platform::Flipkart, FLIPKART_URL);
    let az = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL);
    let fk_total = fk.as_ref().unwrap().total_score();
    let az_total = az.as_ref().unwrap().total_score();

    let result = compare(fk, az);
    let expected = if fk_total.abs_diff(az_total) < TIE_THRESHOLD {
        Winner::Tie
    } else if fk_total > az_total {
        Winner::Flipkart
    } else {
        Winner::Amazon
    };
    assert_eq!(result.winner, expected);

    let delta = result.price_difference.as_ref().unwrap();
    assert_eq!(delta.amount, 1500.0);
    assert_eq!(delta.cheaper_on, Platform::Amazon);
    assert_eq!(delta.percentage, 7.9);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["flipkart"]["platform"], "flipkart");
    assert_eq!(json["amazon"]["price"], "₹17,499");
    assert_eq!(json["price_difference"]["cheaper_on"], "amazon");
}

#[test]
fn compare_with_one_side_missing() {
    let az = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL);
    let blocked = analyze_page(BLOCKED_PAGE, Platform::Flipkart, FLIPKART_URL);
    let result = compare(blocked, az);
    assert_eq!(result.winner, Winner::Amazon);
    assert!(result.price_difference.is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["flipkart"].is_null());
    assert!(json["price_difference"].is_null());

    let nothing = compare(None, None);
    assert_eq!(serde_json::to_value(&nothing).unwrap()["winner"], "none");
}

#[test]
fn scoring_is_deterministic() {
    let a = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL).unwrap();
    let b = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL).unwrap();
    assert_eq!(a, b);
    let total = a.total_score();
    assert!(total <= 100);
}

#[test]
fn saved_records_round_through_memory_store() {
    let store = MemoryStore::new();
    let record = analyze_page(AMAZON_PAGE, Platform::Amazon, AMAZON_URL).unwrap();
    let id = store.save(&record, Some("cmp-42")).unwrap();
    assert_eq!(id, product_id(&record.source_url));

    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].score, Some(90));
    assert_eq!(products[0].verdict.as_deref(), Some("Highly Recommended"));
    assert_eq!(store.reviews().len(), 3);
    assert!(store.reviews().iter().all(|r| r.product_id == id));
}
