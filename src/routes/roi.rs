//! Cost comparison: what the selected inquiries would have cost with
//! manual handling versus the assistant, per pricing-table parameters.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::metrics::{round_to, safe_percent};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::{EventRow, PricingParams};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySavings {
    pub category: String,
    pub count: usize,
    pub manual_cost: f64,
    pub ailean_cost: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoiResponse {
    /// Distinct conversations stand in for units served.
    pub total_units: usize,
    pub total_inquiries: usize,
    pub category_breakdown: Vec<CategorySavings>,
    pub kosten_ohne_ailean: f64,
    pub kosten_mit_ailean: f64,
    pub ersparnis: f64,
    pub savings_percentage: f64,
}

pub(crate) fn build_roi(events: &[EventRow], pricing: &PricingParams) -> RoiResponse {
    let total_inquiries = events.len();
    let manual = pricing.manual_cost_per_inquiry;
    let assistant = pricing.assistant_cost_per_inquiry;

    // Inquiry type wins over the deficiency category when both are set.
    let mut categories: HashMap<&str, usize> = HashMap::new();
    for row in events {
        let category = row
            .inquiry_type
            .as_deref()
            .or(row.deficiency_category.as_deref())
            .unwrap_or("unknown");
        *categories.entry(category).or_default() += 1;
    }
    let mut category_breakdown: Vec<CategorySavings> = categories
        .into_iter()
        .map(|(category, count)| CategorySavings {
            category: category.to_string(),
            count,
            manual_cost: round_to(count as f64 * manual, 2),
            ailean_cost: round_to(count as f64 * assistant, 2),
            savings: round_to(count as f64 * (manual - assistant), 2),
        })
        .collect();
    category_breakdown.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });

    let kosten_ohne_ailean = round_to(total_inquiries as f64 * manual, 2);
    let kosten_mit_ailean = round_to(total_inquiries as f64 * assistant, 2);
    let ersparnis = round_to(kosten_ohne_ailean - kosten_mit_ailean, 2);

    let conversations: HashSet<Option<&str>> = events
        .iter()
        .map(|r| r.conversation_id.as_deref())
        .collect();

    RoiResponse {
        total_units: conversations.len(),
        total_inquiries,
        category_breakdown,
        kosten_ohne_ailean,
        kosten_mit_ailean,
        ersparnis,
        savings_percentage: safe_percent(ersparnis, kosten_ohne_ailean, 1),
    }
}

#[utoipa::path(
    get,
    path = "/api/roi",
    params(FilterParams),
    responses(
        (status = 200, description = "Cost comparison per pricing parameters", body = RoiResponse),
        (status = 404, description = "No events in the selected window"),
    )
)]
pub(crate) async fn roi_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<RoiResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (events, pricing) = try_join!(fetch::events(&data, &filters), fetch::pricing(&data))
        .map_err(ApiError::fetch)?;
    if events.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_roi(&events, &pricing)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/roi", get(roi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(conversation: &str, inquiry_type: Option<&str>, category: Option<&str>) -> EventRow {
        EventRow::from_value(&json!({
            "conversation_id": conversation,
            "inquiry_type": inquiry_type,
            "deficiency_category": category,
        }))
    }

    #[test]
    fn totals_use_the_pricing_parameters() {
        let events = vec![
            event("c1", Some("Heizung"), None),
            event("c1", Some("Heizung"), None),
            event("c2", None, Some("Fenster")),
        ];
        let roi = build_roi(&events, &PricingParams::default());
        assert_eq!(roi.total_inquiries, 3);
        assert_eq!(roi.total_units, 2);
        assert_eq!(roi.kosten_ohne_ailean, 45.0);
        assert_eq!(roi.kosten_mit_ailean, 6.0);
        assert_eq!(roi.ersparnis, 39.0);
        assert_eq!(roi.savings_percentage, 86.7);
    }

    #[test]
    fn inquiry_type_wins_over_the_deficiency_category() {
        let events = vec![
            event("c1", Some("Allgemein"), Some("Heizung")),
            event("c2", None, Some("Heizung")),
            event("c3", None, None),
        ];
        let roi = build_roi(&events, &PricingParams::default());
        let labels: Vec<&str> = roi
            .category_breakdown
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(labels, vec!["Allgemein", "Heizung", "unknown"]);
        assert_eq!(roi.category_breakdown[0].savings, 13.0);
    }

    #[test]
    fn custom_pricing_changes_the_spread() {
        let pricing = PricingParams {
            manual_cost_per_inquiry: 20.0,
            assistant_cost_per_inquiry: 5.0,
        };
        let roi = build_roi(&[event("c1", None, None)], &pricing);
        assert_eq!(roi.kosten_ohne_ailean, 20.0);
        assert_eq!(roi.ersparnis, 15.0);
        assert_eq!(roi.savings_percentage, 75.0);
    }
}
