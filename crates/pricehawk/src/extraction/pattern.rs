//! Last-resort regex scan over the raw markup.

use super::pipeline::ExtractionStrategy;
use super::Page;
use crate::marketplace::MarketplaceProfile;
use crate::plausibility::Plausibility;
use crate::types::{Field, FieldValue};

/// Runs the profile's patterns for a field over the whole unparsed page.
///
/// Raw-text prices are noisier than marked-up ones, so the profile may raise
/// the lower price bound for this layer only.
#[derive(Debug, Clone, Copy)]
pub struct PatternScan<'p> {
    profile: &'p MarketplaceProfile,
}

impl<'p> PatternScan<'p> {
    pub fn new(profile: &'p MarketplaceProfile) -> Self {
        Self { profile }
    }

    fn gate_for(&self, field: Field, gate: &Plausibility) -> Plausibility {
        match (field, self.profile.pattern_price_floor) {
            (Field::Price, Some(floor)) => {
                Plausibility::new(gate.price_min.max(floor), gate.price_max)
            }
            _ => *gate,
        }
    }
}

impl ExtractionStrategy for PatternScan<'_> {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn attempt(&self, field: Field, page: &Page<'_>, gate: &Plausibility) -> Option<FieldValue> {
        let gate = self.gate_for(field, gate);
        self.profile.patterns_for(field).iter().find_map(|re| {
            re.captures_iter(page.raw)
                .filter_map(|caps| caps.get(1))
                .find_map(|m| gate.check(field, m.as_str()))
        })
    }
}
