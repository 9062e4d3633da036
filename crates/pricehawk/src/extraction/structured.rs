//! JSON-LD `Product` islands.

use std::sync::OnceLock;

use scraper::{Html, Selector};
use serde_json::Value;

use super::pipeline::ExtractionStrategy;
use super::Page;
use crate::plausibility::Plausibility;
use crate::types::{Field, FieldValue};

fn ld_json_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| {
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector is valid")
    })
}

/// Every `Product` object embedded in the document, in island order.
///
/// Islands that are empty or fail to parse are skipped. Top-level arrays and
/// `@graph` arrays are walked.
pub fn product_islands(document: &Html) -> Vec<Value> {
    let mut products = Vec::new();
    for element in document.select(ld_json_selector()) {
        let text = element.inner_html();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            collect_products(value, &mut products);
        }
    }
    products
}

fn collect_products(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(Value::Array(graph)) = map.remove("@graph") {
                for item in graph {
                    collect_products(item, out);
                }
            }
            let value = Value::Object(map);
            if is_product(&value) {
                out.push(value);
            }
        }
        _ => {}
    }
}

fn is_product(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Raw candidates a product object offers for `field`, best first.
pub fn candidates(product: &Value, field: Field) -> Vec<String> {
    match field {
        Field::Title => string_at(product.get("name")).into_iter().collect(),
        Field::Price => {
            let offer = match product.get("offers") {
                Some(Value::Array(list)) => list.first(),
                other => other,
            };
            let Some(offer) = offer else {
                return Vec::new();
            };
            ["price", "lowPrice"]
                .iter()
                .filter_map(|key| offer.get(*key).and_then(whole_amount))
                .map(|amount| amount.to_string())
                .collect()
        }
        Field::Image => {
            let image = match product.get("image") {
                Some(Value::Array(list)) => list.first(),
                other => other,
            };
            image
                .and_then(|i| string_at(Some(i)).or_else(|| string_at(i.get("url"))))
                .into_iter()
                .collect()
        }
        Field::Rating => product
            .get("aggregateRating")
            .and_then(|r| r.get("ratingValue"))
            .and_then(number_at)
            .map(|v| v.to_string())
            .into_iter()
            .collect(),
        Field::Brand => product
            .get("brand")
            .and_then(|b| string_at(b.get("name")).or_else(|| string_at(Some(b))))
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn string_at(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_at(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Offer prices are cast to whole rupees: `18999.0` and `"18999.50"` both
/// become 18999.
fn whole_amount(value: &Value) -> Option<u64> {
    let amount = number_at(value)?;
    (amount.is_finite() && amount >= 0.0).then(|| amount.trunc() as u64)
}

/// Highest-priority strategy: embedded structured data.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredData;

impl ExtractionStrategy for StructuredData {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn attempt(&self, field: Field, page: &Page<'_>, gate: &Plausibility) -> Option<FieldValue> {
        page.products
            .iter()
            .flat_map(|product| candidates(product, field))
            .find_map(|raw| gate.check(field, &raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page<'_> {
        Page::parse(html)
    }

    #[test]
    fn test_product_island() {
        let html = r#"<html><head><script type="application/ld+json">
        {
          "@context": "https://schema.org",
          "@type": "Product",
          "name": "Phone X",
          "image": ["https://img.example.com/x1.jpg", "https://img.example.com/x2.jpg"],
          "brand": {"@type": "Brand", "name": "Acme"},
          "offers": [{"@type": "Offer", "price": 18999.0, "priceCurrency": "INR"}],
          "aggregateRating": {"ratingValue": "4.62", "reviewCount": 120}
        }
        </script></head><body></body></html>"#;
        let p = page(html);
        let gate = Plausibility::new(500, 1_000_000);
        let s = StructuredData;
        assert_eq!(
            s.attempt(Field::Title, &p, &gate),
            Some(FieldValue::Text("Phone X".into()))
        );
        assert_eq!(
            s.attempt(Field::Price, &p, &gate),
            Some(FieldValue::Text("₹18,999".into()))
        );
        assert_eq!(
            s.attempt(Field::Image, &p, &gate),
            Some(FieldValue::Text("https://img.example.com/x1.jpg".into()))
        );
        assert_eq!(s.attempt(Field::Rating, &p, &gate), Some(FieldValue::Rating(4.6)));
        assert_eq!(
            s.attempt(Field::Brand, &p, &gate),
            Some(FieldValue::Text("Acme".into()))
        );
        assert_eq!(s.attempt(Field::Ram, &p, &gate), None);
    }

    #[test]
    fn test_graph_and_array_islands() {
        let html = r#"
        <script type="application/ld+json">
        [{"@type": "BreadcrumbList"}, {"@type": ["Thing", "Product"], "name": "Array Phone"}]
        </script>
        <script type="application/ld+json">
        {"@graph": [{"@type": "WebSite", "name": "Shop"}, {"@type": "Product", "name": "Graph Phone"}]}
        </script>"#;
        let p = page(html);
        assert_eq!(p.products.len(), 2);
        assert_eq!(p.products[0]["name"], "Array Phone");
        assert_eq!(p.products[1]["name"], "Graph Phone");
    }

    #[test]
    fn test_malformed_islands_skipped() {
        let html = r#"
        <script type="application/ld+json">{ not json </script>
        <script type="application/ld+json">   </script>
        <script type="application/ld+json">{"@type": "Product", "name": "Survivor"}</script>"#;
        let p = page(html);
        assert_eq!(p.products.len(), 1);
    }

    #[test]
    fn test_price_candidates() {
        let low: Value = serde_json::json!({"offers": {"lowPrice": "17499.99"}});
        assert_eq!(candidates(&low, Field::Price), vec!["17499".to_string()]);

        let bad: Value = serde_json::json!({"offers": {"price": "call us"}});
        assert!(candidates(&bad, Field::Price).is_empty());

        let brand: Value = serde_json::json!({"brand": "Acme"});
        assert_eq!(candidates(&brand, Field::Brand), vec!["Acme".to_string()]);
    }

    #[test]
    fn test_out_of_bounds_price_rejected() {
        let html = r#"<script type="application/ld+json">
        {"@type": "Product", "offers": {"price": 99}}</script>"#;
        let p = page(html);
        assert_eq!(
            StructuredData.attempt(Field::Price, &p, &Plausibility::new(500, 1_000_000)),
            None
        );
    }
}
