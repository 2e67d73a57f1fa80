//! Join resolver for the accommodation -> condominium -> property ->
//! deficiency chain.

use std::collections::HashMap;

use crate::analytics::breakdown::UNKNOWN_LABEL;
use crate::filters::DashboardFilters;
use crate::models::{Accommodation, Condominium, Deficiency, Property};

/// A deficiency with its portfolio attribution attached. Broken chains
/// yield "unknown" attributes; the row is still counted everywhere.
#[derive(Debug, Clone)]
pub struct EnrichedDeficiency {
    pub deficiency: Deficiency,
    pub brand: String,
    pub building_address: String,
    pub property_owner: Option<String>,
    pub apartment_number: Option<String>,
    pub accommodation_id: Option<String>,
}

impl EnrichedDeficiency {
    /// Case-insensitive substring match against the attributed brand.
    pub fn matches_brand(&self, needle: &str) -> bool {
        self.brand.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Id-keyed lookup tables over the three reference tables.
pub struct PropertyHierarchy {
    accommodations: HashMap<String, Accommodation>,
    condominia: HashMap<String, Condominium>,
    properties: HashMap<String, Property>,
}

impl PropertyHierarchy {
    pub fn new(
        accommodations: Vec<Accommodation>,
        condominia: Vec<Condominium>,
        properties: Vec<Property>,
    ) -> Self {
        Self {
            accommodations: accommodations
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
            condominia: condominia.into_iter().map(|c| (c.id.clone(), c)).collect(),
            properties: properties.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    fn walk(
        &self,
        property_id: Option<&str>,
    ) -> (
        Option<&Property>,
        Option<&Condominium>,
        Option<&Accommodation>,
    ) {
        let property = property_id.and_then(|id| self.properties.get(id));
        let condominium = property
            .and_then(|p| p.condominium_id.as_deref())
            .and_then(|id| self.condominia.get(id));
        let accommodation = condominium
            .and_then(|c| c.accommodation_id.as_deref())
            .and_then(|id| self.accommodations.get(id));
        (property, condominium, accommodation)
    }

    pub fn enrich(&self, deficiency: &Deficiency) -> EnrichedDeficiency {
        let (property, condominium, accommodation) = self.walk(deficiency.property_id.as_deref());
        EnrichedDeficiency {
            deficiency: deficiency.clone(),
            brand: accommodation
                .and_then(|a| a.brand_label())
                .unwrap_or(UNKNOWN_LABEL)
                .to_string(),
            building_address: condominium
                .and_then(|c| c.address.as_deref())
                .unwrap_or(UNKNOWN_LABEL)
                .to_string(),
            property_owner: condominium.and_then(|c| c.property_owner.clone()),
            apartment_number: property.and_then(|p| p.apartment_number.clone()),
            accommodation_id: condominium.and_then(|c| c.accommodation_id.clone()),
        }
    }

    /// Enrich every deficiency, then apply the brand substring filter and
    /// the date window on `time_added`. Rows without a creation timestamp
    /// are dropped here because none of the date arithmetic can place them.
    pub fn enrich_filtered(
        &self,
        deficiencies: &[Deficiency],
        filters: &DashboardFilters,
    ) -> Vec<EnrichedDeficiency> {
        deficiencies
            .iter()
            .map(|d| self.enrich(d))
            .filter(|enriched| match &filters.brand {
                Some(brand) => enriched.matches_brand(brand),
                None => true,
            })
            .filter(|enriched| match enriched.deficiency.time_added {
                Some(added) => filters.contains(added),
                None => false,
            })
            .collect()
    }

    /// Number of rental units attributable to the given brand filter
    /// (all units when unrestricted). Units with broken chains count only
    /// when no brand filter is active.
    pub fn unit_count(&self, brand: Option<&str>) -> usize {
        self.properties
            .values()
            .filter(|property| {
                let Some(needle) = brand else {
                    return true;
                };
                let condominium = property
                    .condominium_id
                    .as_deref()
                    .and_then(|id| self.condominia.get(id));
                let accommodation = condominium
                    .and_then(|c| c.accommodation_id.as_deref())
                    .and_then(|id| self.accommodations.get(id));
                accommodation
                    .and_then(|a| a.brand_label())
                    .map(|label| label.to_lowercase().contains(&needle.to_lowercase()))
                    .unwrap_or(false)
            })
            .count()
    }
}
