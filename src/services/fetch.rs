//! Typed fetchers for the data service tables and views.
//!
//! Routes go through these instead of the raw client so table names and
//! column projections live in one place.

use anyhow::Result;
use tokio::try_join;

use crate::analytics::hierarchy::PropertyHierarchy;
use crate::filters::DashboardFilters;
use crate::models::{
    Accommodation, CompanyConfig, Condominium, CorrectionRow, Craftsman, Deficiency, EventRow,
    HierarchyStatsRow, PricingParams, Property,
};
use crate::services::data_source::DataServiceClient;

/// JOIN view over the inquiry events and their AI analysis.
pub const BASE_VIEW: &str = "v_dashboard_base";
/// Pre-aggregated per-building stats view.
pub const HIERARCHY_VIEW: &str = "v_property_hierarchy";

const ACCOMMODATIONS: &str = "azure_accommodations";
const CONDOMINIA: &str = "azure_real_estate_condominia";
const PROPERTIES: &str = "azure_real_estate_properties";
const DEFICIENCIES: &str = "azure_real_estate_deficiencies";
const CRAFTSMEN: &str = "azure_real_estate_craftsmen";
const COMPANY_CONFIGS: &str = "azure_real_estate_company_configurations";
const PRICING: &str = "ailean_pricing";
const CORRECTIONS: &str = "ai_analysis_corrections";

const DEFICIENCY_SELECT: &str = "id,real_estate_property_id,craftsman_id,deficiency_types,\
deficiency_state,time_added,next_follow_up,tenant_name,tenant_phone_number,deficiency_report,\
total_cost";

/// Filtered inquiry events; date and brand predicates are pushed down to
/// the data service.
pub async fn events(
    data: &DataServiceClient,
    filters: &DashboardFilters,
) -> Result<Vec<EventRow>> {
    let rows = data
        .fetch_all(BASE_VIEW, "*", &filters.event_predicates())
        .await?;
    Ok(rows.iter().map(EventRow::from_value).collect())
}

/// The three reference tables joined into one lookup structure. Rows
/// without an id are dropped.
pub async fn hierarchy(data: &DataServiceClient) -> Result<PropertyHierarchy> {
    let (accommodations, condominia, properties) = try_join!(
        data.fetch_all(ACCOMMODATIONS, "id,name,brand", &[]),
        data.fetch_all(CONDOMINIA, "id,accommodation_id,address,property_owner", &[]),
        data.fetch_all(
            PROPERTIES,
            "id,real_estate_condominium_id,apartment_number",
            &[]
        ),
    )?;
    Ok(PropertyHierarchy::new(
        accommodations
            .iter()
            .filter_map(Accommodation::from_value)
            .collect(),
        condominia
            .iter()
            .filter_map(Condominium::from_value)
            .collect(),
        properties.iter().filter_map(Property::from_value).collect(),
    ))
}

/// Every maintenance ticket. Brand and date filters cannot be pushed down
/// here; attribution needs the hierarchy walk first.
pub async fn deficiencies(data: &DataServiceClient) -> Result<Vec<Deficiency>> {
    let rows = data.fetch_all(DEFICIENCIES, DEFICIENCY_SELECT, &[]).await?;
    Ok(rows.iter().filter_map(Deficiency::from_value).collect())
}

pub async fn craftsmen(data: &DataServiceClient) -> Result<Vec<Craftsman>> {
    let rows = data
        .fetch_all(CRAFTSMEN, "id,email,company,trade", &[])
        .await?;
    Ok(rows.iter().filter_map(Craftsman::from_value).collect())
}

pub async fn company_configs(data: &DataServiceClient) -> Result<Vec<CompanyConfig>> {
    let rows = data
        .fetch_all(
            COMPANY_CONFIGS,
            "accommodation_id,cosmetic_issue_response_time,\
partial_limitation_response_time,severe_deficiency_response_time",
            &[],
        )
        .await?;
    Ok(rows.iter().filter_map(CompanyConfig::from_value).collect())
}

/// Reviewer corrections; the table is small and carries no filterable
/// timestamp, so it is always fetched whole.
pub async fn corrections(data: &DataServiceClient) -> Result<Vec<CorrectionRow>> {
    let rows = data.fetch_all(CORRECTIONS, "*", &[]).await?;
    Ok(rows.iter().map(CorrectionRow::from_value).collect())
}

/// Owner/building aggregates; the brand restriction (but not the date
/// window, the view has no timestamp) is pushed down.
pub async fn hierarchy_stats(
    data: &DataServiceClient,
    filters: &DashboardFilters,
) -> Result<Vec<HierarchyStatsRow>> {
    let mut predicates = Vec::new();
    if let Some(brand) = &filters.brand {
        predicates.push(("brand".to_string(), format!("eq.{brand}")));
    }
    let rows = data.fetch_all(HIERARCHY_VIEW, "*", &predicates).await?;
    Ok(rows.iter().map(HierarchyStatsRow::from_value).collect())
}

/// Cost parameters; a missing or empty pricing table yields the documented
/// defaults rather than an error.
pub async fn pricing(data: &DataServiceClient) -> Result<PricingParams> {
    let row = data.fetch_first(PRICING, "*").await?;
    Ok(row
        .map(|value| PricingParams::from_value(&value))
        .unwrap_or_default())
}
