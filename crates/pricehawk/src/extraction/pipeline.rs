//! Per-field fallback cascade.

use tracing::debug;

use super::{Page, PatternScan, SelectorTable, StructuredData};
use crate::marketplace::MarketplaceProfile;
use crate::plausibility::Plausibility;
use crate::types::{Field, FieldValue, ProductRecord};

/// One source of field candidates.
///
/// A strategy returns only values that already passed `gate`; `None` means
/// "nothing plausible here", never an error.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    fn attempt(&self, field: Field, page: &Page<'_>, gate: &Plausibility) -> Option<FieldValue>;
}

/// Runs strategies in priority order and stops at the first plausible value.
pub struct FieldResolver<'p> {
    gate: Plausibility,
    strategies: Vec<Box<dyn ExtractionStrategy + 'p>>,
}

impl<'p> FieldResolver<'p> {
    /// Structured data, then the selector table, then raw patterns.
    pub fn for_profile(profile: &'p MarketplaceProfile) -> Self {
        Self::with_strategies(
            profile.gate,
            vec![
                Box::new(StructuredData),
                Box::new(SelectorTable::new(profile)),
                Box::new(PatternScan::new(profile)),
            ],
        )
    }

    pub fn with_strategies(
        gate: Plausibility,
        strategies: Vec<Box<dyn ExtractionStrategy + 'p>>,
    ) -> Self {
        Self { gate, strategies }
    }

    /// Resolve one field. Returns the value and the name of the strategy
    /// that produced it.
    pub fn resolve(&self, field: Field, page: &Page<'_>) -> Option<(FieldValue, &'static str)> {
        self.strategies.iter().find_map(|strategy| {
            strategy
                .attempt(field, page, &self.gate)
                .map(|value| (value, strategy.name()))
        })
    }

    /// Resolve every field that `record` does not hold yet.
    pub fn resolve_into(&self, page: &Page<'_>, record: &mut ProductRecord) {
        for field in Field::ALL {
            if record.has(field) {
                continue;
            }
            match self.resolve(field, page) {
                Some((value, source)) => {
                    debug!(platform = %record.platform, %field, source, ?value, "field resolved");
                    record.set(field, value);
                }
                None => debug!(platform = %record.platform, %field, "field unresolved"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::profile;
    use crate::types::Platform;
    use std::cell::RefCell;

    struct Fixed(&'static str, Option<&'static str>);

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn attempt(&self, field: Field, _page: &Page<'_>, gate: &Plausibility) -> Option<FieldValue> {
            self.1.and_then(|raw| gate.check(field, raw))
        }
    }

    struct Spy<'a>(&'a RefCell<Vec<Field>>);

    impl ExtractionStrategy for Spy<'_> {
        fn name(&self) -> &'static str {
            "spy"
        }

        fn attempt(&self, field: Field, _page: &Page<'_>, _gate: &Plausibility) -> Option<FieldValue> {
            self.0.borrow_mut().push(field);
            None
        }
    }

    #[test]
    fn test_first_plausible_wins() {
        let page = Page::parse("<html></html>");
        let resolver = FieldResolver::with_strategies(
            Plausibility::default(),
            vec![
                Box::new(Fixed("a", Some("   "))),
                Box::new(Fixed("b", Some("Phone X"))),
                Box::new(Fixed("c", Some("Phone Y"))),
            ],
        );
        let (value, source) = resolver.resolve(Field::Title, &page).unwrap();
        assert_eq!(value, FieldValue::Text("Phone X".into()));
        assert_eq!(source, "b");
    }

    #[test]
    fn test_later_strategies_not_consulted_after_success() {
        let calls = RefCell::new(Vec::new());
        let page = Page::parse("<html></html>");
        let resolver = FieldResolver::with_strategies(
            Plausibility::default(),
            vec![Box::new(Fixed("first", Some("4.1"))), Box::new(Spy(&calls))],
        );
        let mut record = ProductRecord::new(Platform::Amazon, "u");
        resolver.resolve_into(&page, &mut record);
        assert_eq!(record.rating, Some(4.1));
        assert_eq!(record.title.as_deref(), Some("4.1"));
        let calls = calls.borrow();
        assert!(!calls.contains(&Field::Rating));
        assert!(!calls.contains(&Field::Title));
        // "4.1" is neither a plausible price nor an image URL.
        assert!(calls.contains(&Field::Price));
        assert!(calls.contains(&Field::Image));
    }

    #[test]
    fn test_populated_fields_are_kept() {
        let calls = RefCell::new(Vec::new());
        let page = Page::parse("<html></html>");
        let resolver =
            FieldResolver::with_strategies(Plausibility::default(), vec![Box::new(Spy(&calls))]);
        let mut record = ProductRecord::new(Platform::Flipkart, "u");
        record.title = Some("Kept".into());
        resolver.resolve_into(&page, &mut record);
        assert_eq!(record.title.as_deref(), Some("Kept"));
        assert!(!calls.borrow().contains(&Field::Title));
        assert_eq!(calls.borrow().len(), Field::ALL.len() - 1);
    }

    #[test]
    fn test_structured_beats_disagreeing_markup() {
        let html = r#"<html><head>
        <meta property="og:title" content="Markup Phone - Buy Online | Flipkart">
        <script type="application/ld+json">
        {"@type": "Product", "name": "Island Phone", "offers": {"price": "18999"}}
        </script></head>
        <body><div class="Nx9bqj">₹25,999</div><p>₹30,000</p></body></html>"#;
        let page = Page::parse(html);
        let resolver = FieldResolver::for_profile(profile(Platform::Flipkart));
        let (title, src) = resolver.resolve(Field::Title, &page).unwrap();
        assert_eq!(title, FieldValue::Text("Island Phone".into()));
        assert_eq!(src, "structured");
        let (price, src) = resolver.resolve(Field::Price, &page).unwrap();
        assert_eq!(price, FieldValue::Text("₹18,999".into()));
        assert_eq!(src, "structured");
    }

    #[test]
    fn test_falls_back_through_layers() {
        let html = r#"<html><body>
        <div class="Nx9bqj">₹99</div>
        <p>Special price ₹ 12,999</p>
        </body></html>"#;
        let page = Page::parse(html);
        let resolver = FieldResolver::for_profile(profile(Platform::Flipkart));
        let (price, src) = resolver.resolve(Field::Price, &page).unwrap();
        assert_eq!(price, FieldValue::Text("₹12,999".into()));
        assert_eq!(src, "pattern");
    }
}
