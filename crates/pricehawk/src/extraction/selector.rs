//! Declarative CSS probes from the marketplace profile.

use super::pipeline::ExtractionStrategy;
use super::Page;
use crate::marketplace::MarketplaceProfile;
use crate::plausibility::Plausibility;
use crate::types::{Field, FieldValue};

/// Walks the document with the profile's probes for a field.
///
/// Probes run in table order. Every element a probe matches is tried in
/// document order, so a stale marker that matches an empty element does not
/// hide a good one further down.
#[derive(Debug, Clone, Copy)]
pub struct SelectorTable<'p> {
    profile: &'p MarketplaceProfile,
}

impl<'p> SelectorTable<'p> {
    pub fn new(profile: &'p MarketplaceProfile) -> Self {
        Self { profile }
    }
}

impl ExtractionStrategy for SelectorTable<'_> {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn attempt(&self, field: Field, page: &Page<'_>, gate: &Plausibility) -> Option<FieldValue> {
        self.profile.probes(field).iter().find_map(|probe| {
            page.document
                .select(&probe.selector)
                .filter_map(|el| probe.read(&el))
                .find_map(|raw| gate.check(field, &raw))
        })
    }
}
