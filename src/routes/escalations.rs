//! Escalation review KPIs for the novac portfolio.
//!
//! The endpoint always pins the brand to `novac`; date filters from the
//! query still apply.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::breakdown::{BreakdownCounter, BreakdownItem};
use crate::analytics::categories::{
    CLOSING_STATES, DEFICIENCY_TYPES_V1, FIRST_ESCALATION_STATES, SECOND_ESCALATION_STATES,
};
use crate::analytics::hierarchy::EnrichedDeficiency;
use crate::analytics::metrics::{round_to, safe_avg, safe_percent};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

const PINNED_BRAND: &str = "novac";

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildingEscalation {
    pub address: String,
    pub count: usize,
    pub escalated: usize,
    pub escalation_rate: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EscalationsResponse {
    pub total_tickets: usize,
    pub first_escalation: usize,
    pub second_escalation: usize,
    pub topic_breakdown: Vec<BreakdownItem>,
    pub building_breakdown: Vec<BuildingEscalation>,
    pub avg_processing_days: f64,
    pub bug_count: usize,
    pub bug_rate: f64,
    pub bug_category_breakdown: Vec<BreakdownItem>,
    /// First-stage over second-stage escalations; null when there are
    /// first-stage escalations but no second-stage ones.
    pub escalation_ratio: Option<f64>,
    pub total_events: usize,
    pub conversion_rate: f64,
}

pub(crate) fn build_escalations(
    enriched: &[EnrichedDeficiency],
    events: &[EventRow],
) -> EscalationsResponse {
    let total = enriched.len();

    let first_escalation = enriched
        .iter()
        .filter(|d| FIRST_ESCALATION_STATES.contains(&d.deficiency.state))
        .count();
    let second_escalation = enriched
        .iter()
        .filter(|d| SECOND_ESCALATION_STATES.contains(&d.deficiency.state))
        .count();

    let mut topic_counter = BreakdownCounter::new();
    for item in enriched {
        for label in DEFICIENCY_TYPES_V1.decode(item.deficiency.type_bits) {
            topic_counter.add_label(label);
        }
    }

    let mut buildings: HashMap<&str, (usize, usize)> = HashMap::new();
    for item in enriched {
        let entry = buildings.entry(item.building_address.as_str()).or_default();
        entry.0 += 1;
        if FIRST_ESCALATION_STATES.contains(&item.deficiency.state)
            || SECOND_ESCALATION_STATES.contains(&item.deficiency.state)
        {
            entry.1 += 1;
        }
    }
    let mut building_breakdown: Vec<BuildingEscalation> = buildings
        .into_iter()
        .map(|(address, (count, escalated))| BuildingEscalation {
            address: address.to_string(),
            count,
            escalated,
            escalation_rate: safe_percent(escalated as f64, count as f64, 1),
        })
        .collect();
    building_breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.address.cmp(&b.address)));

    let closing_times: Vec<f64> = enriched
        .iter()
        .filter(|d| CLOSING_STATES.contains(&d.deficiency.state))
        .filter_map(|d| {
            let added = d.deficiency.time_added?;
            let follow_up = d.deficiency.valid_follow_up()?;
            Some(((follow_up - added).num_milliseconds() as f64 / 86_400_000.0).max(0.0))
        })
        .collect();
    let avg_processing_days = safe_avg(closing_times.iter().sum(), closing_times.len() as f64, 1);

    let bug_count = events.iter().filter(|r| r.is_bug).count();
    let mut bug_counter = BreakdownCounter::new();
    for row in events {
        if row.is_bug {
            if let Some(category) = row.bug_category.as_deref() {
                bug_counter.add_label(category);
            }
        }
    }

    let escalation_ratio = if second_escalation > 0 {
        Some(round_to(
            first_escalation as f64 / second_escalation as f64,
            2,
        ))
    } else if first_escalation > 0 {
        None
    } else {
        Some(0.0)
    };

    EscalationsResponse {
        total_tickets: total,
        first_escalation,
        second_escalation,
        topic_breakdown: topic_counter.into_breakdown(total),
        building_breakdown,
        avg_processing_days,
        bug_count,
        bug_rate: safe_percent(bug_count as f64, events.len() as f64, 1),
        bug_category_breakdown: bug_counter.into_breakdown(bug_count),
        escalation_ratio,
        total_events: events.len(),
        conversion_rate: safe_percent(total as f64, events.len() as f64, 1),
    }
}

#[utoipa::path(
    get,
    path = "/api/escalations",
    params(FilterParams),
    responses(
        (status = 200, description = "Escalation KPIs for the novac portfolio", body = EscalationsResponse),
    )
)]
pub(crate) async fn escalations_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<EscalationsResponse>> {
    let mut filters = DashboardFilters::from_params(&params);
    filters.brand = Some(PINNED_BRAND.to_string());

    let (hierarchy, deficiencies, events) = try_join!(
        fetch::hierarchy(&data),
        fetch::deficiencies(&data),
        fetch::events(&data, &filters),
    )
    .map_err(ApiError::fetch)?;

    let enriched = hierarchy.enrich_filtered(&deficiencies, &filters);
    Ok(Json(build_escalations(&enriched, &events)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/escalations", get(escalations_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::hierarchy::PropertyHierarchy;
    use crate::models::{Accommodation, Condominium, Deficiency, Property};
    use serde_json::json;

    fn hierarchy() -> PropertyHierarchy {
        PropertyHierarchy::new(
            vec![
                Accommodation::from_value(&json!({ "id": "a1", "name": "Novac", "brand": "novac" }))
                    .unwrap(),
            ],
            vec![Condominium::from_value(
                &json!({ "id": "c1", "accommodation_id": "a1", "address": "Seeweg 5" }),
            )
            .unwrap()],
            vec![
                Property::from_value(&json!({ "id": "p1", "real_estate_condominium_id": "c1" }))
                    .unwrap(),
            ],
        )
    }

    fn ticket(state: i64) -> EnrichedDeficiency {
        hierarchy().enrich(
            &Deficiency::from_value(&json!({
                "id": format!("d{state}"),
                "real_estate_property_id": "p1",
                "deficiency_types": 8,
                "deficiency_state": state,
                "time_added": "2026-01-10T00:00:00Z",
            }))
            .unwrap(),
        )
    }

    #[test]
    fn escalation_stages_count_their_state_sets() {
        let enriched = vec![ticket(6), ticket(9), ticket(11), ticket(0)];
        let response = build_escalations(&enriched, &[]);
        assert_eq!(response.first_escalation, 2);
        assert_eq!(response.second_escalation, 1);
        assert_eq!(response.escalation_ratio, Some(2.0));
    }

    #[test]
    fn ratio_is_null_without_second_stage_escalations() {
        let response = build_escalations(&[ticket(6)], &[]);
        assert_eq!(response.escalation_ratio, None);

        let response = build_escalations(&[ticket(0)], &[]);
        assert_eq!(response.escalation_ratio, Some(0.0));
    }

    #[test]
    fn building_breakdown_counts_the_escalated_union() {
        let enriched = vec![ticket(6), ticket(13), ticket(0)];
        let response = build_escalations(&enriched, &[]);
        assert_eq!(response.building_breakdown.len(), 1);
        let building = &response.building_breakdown[0];
        assert_eq!(building.address, "Seeweg 5");
        assert_eq!(building.count, 3);
        assert_eq!(building.escalated, 2);
        assert_eq!(building.escalation_rate, 66.7);
    }

    #[test]
    fn bug_stats_come_from_the_event_view() {
        let events = vec![
            EventRow::from_value(&json!({ "is_bug": true, "bug_category": "wrong_category" })),
            EventRow::from_value(&json!({ "is_bug": false })),
        ];
        let response = build_escalations(&[ticket(0)], &events);
        assert_eq!(response.bug_count, 1);
        assert_eq!(response.bug_rate, 50.0);
        assert_eq!(response.bug_category_breakdown[0].label, "wrong_category");
        assert_eq!(response.conversion_rate, 50.0);
    }
}
