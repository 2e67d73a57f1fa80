//! Report-volume KPIs along the portfolio dimensions: owner, building,
//! unit, postal code and tenant.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tokio::try_join;

use crate::analytics::breakdown::{BreakdownCounter, BreakdownItem};
use crate::analytics::hierarchy::EnrichedDeficiency;
use crate::analytics::metrics::safe_percent;
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

const TENANT_LIMIT: usize = 50;
const TOP_USER_LIMIT: usize = 20;

/// Swiss postal code: four digits followed by the locality name.
fn postal_code(address: &str) -> Option<&str> {
    static POSTAL: OnceLock<Regex> = OnceLock::new();
    let regex = POSTAL.get_or_init(|| Regex::new(r"(\d{4})\s+\w").unwrap());
    regex
        .captures(address)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct TenantReportCount {
    pub name: String,
    pub phone: String,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    pub total_deficiencies: usize,
    pub unique_tenants: usize,
    pub unique_buildings: usize,
    pub portfolio_breakdown: Vec<BreakdownItem>,
    pub tenant_breakdown: Vec<TenantReportCount>,
    pub top_users: Vec<TenantReportCount>,
    pub owner_breakdown: Vec<BreakdownItem>,
    pub building_breakdown: Vec<BreakdownItem>,
    pub unit_breakdown: Vec<BreakdownItem>,
    pub unit_coverage: f64,
    pub postal_code_breakdown: Vec<BreakdownItem>,
}

pub(crate) fn build_reports(enriched: &[EnrichedDeficiency]) -> ReportsResponse {
    let total = enriched.len();

    let mut portfolio = BreakdownCounter::new();
    let mut owners = BreakdownCounter::new();
    let mut buildings = BreakdownCounter::new();
    let mut units = BreakdownCounter::new();
    let mut postal = BreakdownCounter::new();
    let mut with_unit = 0usize;
    let mut building_set: HashSet<&str> = HashSet::new();

    // Tenants keyed by phone; the first seen name wins.
    let mut tenants: HashMap<String, TenantReportCount> = HashMap::new();

    for item in enriched {
        portfolio.add_label(&item.brand);
        owners.add_label(item.property_owner.as_deref().unwrap_or("Unbekannt"));
        buildings.add_label(&item.building_address);
        building_set.insert(item.building_address.as_str());

        if let Some(apartment) = item.apartment_number.as_deref() {
            with_unit += 1;
            units.add_label(&format!("{} / {}", item.building_address, apartment));
        }
        if let Some(code) = postal_code(&item.building_address) {
            postal.add_label(code);
        }

        let phone = item
            .deficiency
            .tenant_phone
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        tenants
            .entry(phone.clone())
            .or_insert_with(|| TenantReportCount {
                name: item
                    .deficiency
                    .tenant_name
                    .clone()
                    .unwrap_or_else(|| "Unbekannt".to_string()),
                phone,
                count: 0,
            })
            .count += 1;
    }

    let unique_tenants = tenants.len();
    let mut by_count: Vec<TenantReportCount> = tenants.into_values().collect();
    by_count.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.phone.cmp(&b.phone)));
    let tenant_breakdown: Vec<TenantReportCount> =
        by_count.iter().take(TENANT_LIMIT).cloned().collect();
    let top_users: Vec<TenantReportCount> = by_count.into_iter().take(TOP_USER_LIMIT).collect();

    ReportsResponse {
        total_deficiencies: total,
        unique_tenants,
        unique_buildings: building_set.len(),
        portfolio_breakdown: portfolio.into_breakdown(total),
        tenant_breakdown,
        top_users,
        owner_breakdown: owners.into_breakdown(total),
        building_breakdown: buildings.into_breakdown(total),
        unit_breakdown: units.into_breakdown(total),
        unit_coverage: safe_percent(with_unit as f64, total as f64, 1),
        postal_code_breakdown: postal.into_breakdown(total),
    }
}

#[utoipa::path(
    get,
    path = "/api/reports",
    params(FilterParams),
    responses(
        (status = 200, description = "Report volumes along the portfolio dimensions", body = ReportsResponse),
    )
)]
pub(crate) async fn reports_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<ReportsResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (hierarchy, deficiencies) = try_join!(fetch::hierarchy(&data), fetch::deficiencies(&data))
        .map_err(ApiError::fetch)?;
    let enriched = hierarchy.enrich_filtered(&deficiencies, &filters);
    Ok(Json(build_reports(&enriched)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", get(reports_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::hierarchy::PropertyHierarchy;
    use crate::models::{Accommodation, Condominium, Deficiency, Property};
    use serde_json::json;

    #[test]
    fn postal_code_needs_a_following_locality() {
        assert_eq!(postal_code("Bahnhofstrasse 1, 8001 Zuerich"), Some("8001"));
        assert_eq!(postal_code("Seeweg 5, 6000 Luzern"), Some("6000"));
        assert_eq!(postal_code("Postfach 1234"), None);
        assert_eq!(postal_code("unknown"), None);
    }

    fn hierarchy() -> PropertyHierarchy {
        PropertyHierarchy::new(
            vec![
                Accommodation::from_value(&json!({ "id": "a1", "name": "Novac", "brand": "novac" }))
                    .unwrap(),
            ],
            vec![Condominium::from_value(&json!({
                "id": "c1", "accommodation_id": "a1",
                "address": "Bahnhofstrasse 1, 8001 Zuerich", "property_owner": "Muster AG"
            }))
            .unwrap()],
            vec![
                Property::from_value(
                    &json!({ "id": "p1", "real_estate_condominium_id": "c1", "apartment_number": "3B" }),
                )
                .unwrap(),
                Property::from_value(&json!({ "id": "p2", "real_estate_condominium_id": "c1" }))
                    .unwrap(),
            ],
        )
    }

    fn ticket(property: &str, phone: Option<&str>, name: Option<&str>) -> EnrichedDeficiency {
        hierarchy().enrich(
            &Deficiency::from_value(&json!({
                "id": format!("d-{property}-{}", phone.unwrap_or("none")),
                "real_estate_property_id": property,
                "deficiency_types": 8,
                "deficiency_state": 0,
                "time_added": "2026-01-10T00:00:00Z",
                "tenant_phone_number": phone,
                "tenant_name": name,
            }))
            .unwrap(),
        )
    }

    #[test]
    fn tenants_group_by_phone_with_fallback_labels() {
        let enriched = vec![
            ticket("p1", Some("+41790000001"), Some("A. Meier")),
            ticket("p1", Some("+41790000001"), Some("A. Meier")),
            ticket("p2", None, None),
        ];
        let response = build_reports(&enriched);
        assert_eq!(response.unique_tenants, 2);
        assert_eq!(response.tenant_breakdown[0].phone, "+41790000001");
        assert_eq!(response.tenant_breakdown[0].count, 2);
        assert_eq!(response.tenant_breakdown[1].phone, "unknown");
        assert_eq!(response.tenant_breakdown[1].name, "Unbekannt");
    }

    #[test]
    fn unit_coverage_counts_tickets_with_an_apartment() {
        let enriched = vec![
            ticket("p1", Some("+41790000001"), None),
            ticket("p2", Some("+41790000002"), None),
        ];
        let response = build_reports(&enriched);
        assert_eq!(response.unit_coverage, 50.0);
        assert_eq!(
            response.unit_breakdown[0].label,
            "Bahnhofstrasse 1, 8001 Zuerich / 3B"
        );
        assert_eq!(response.postal_code_breakdown[0].label, "8001");
        assert_eq!(response.unique_buildings, 1);
    }
}
