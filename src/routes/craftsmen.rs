//! Craftsman job pipeline: completion, self-repairs and category costs
//! over the events that produced a deficiency report.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::metrics::{round_to, safe_percent};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

/// State labels that count as a finished job, matched case-insensitively
/// as substrings.
const RESOLVED_LABELS: [&str; 6] = [
    "resolved",
    "completed",
    "closed",
    "done",
    "fertig",
    "abgeschlossen",
];

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanOverview {
    pub total_jobs: usize,
    pub completion_rate: f64,
    pub self_repair_count: usize,
    pub self_repair_rate: f64,
    pub craftsman_assigned_rate: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineItem {
    pub state_label: String,
    pub state_category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCostItem {
    pub category: String,
    pub count: usize,
    pub total_cost: f64,
    pub avg_cost: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanResponse {
    pub overview: CraftsmanOverview,
    pub pipeline: Vec<PipelineItem>,
    pub categories: Vec<CategoryCostItem>,
}

fn is_resolved_label(label: &str) -> bool {
    let lowered = label.to_lowercase();
    RESOLVED_LABELS.iter().any(|state| lowered.contains(state))
}

pub(crate) fn build_craftsman_report(events: &[EventRow]) -> CraftsmanResponse {
    let jobs: Vec<&EventRow> = events.iter().filter(|r| r.has_deficiency_report).collect();
    let total_jobs = jobs.len();

    let completed_count = jobs
        .iter()
        .filter(|r| {
            r.deficiency_state_label
                .as_deref()
                .is_some_and(is_resolved_label)
        })
        .count();
    let self_repair_count = jobs
        .iter()
        .filter(|r| r.resolution_method.as_deref() == Some("self_repaired"))
        .count();
    let craftsman_assigned_count = jobs.iter().filter(|r| r.has_craftsman).count();

    let overview = CraftsmanOverview {
        total_jobs,
        completion_rate: safe_percent(completed_count as f64, total_jobs as f64, 1),
        self_repair_count,
        self_repair_rate: safe_percent(self_repair_count as f64, total_jobs as f64, 1),
        craftsman_assigned_rate: safe_percent(craftsman_assigned_count as f64, total_jobs as f64, 1),
    };

    // The first category seen for a state label wins; the view keeps the
    // pairing stable anyway.
    let mut states: HashMap<&str, (usize, &str)> = HashMap::new();
    for row in &jobs {
        let label = row.deficiency_state_label.as_deref().unwrap_or("unknown");
        let entry = states.entry(label).or_insert_with(|| {
            (
                0,
                row.deficiency_state_category.as_deref().unwrap_or("unknown"),
            )
        });
        entry.0 += 1;
    }
    let mut pipeline: Vec<PipelineItem> = states
        .into_iter()
        .map(|(label, (count, category))| PipelineItem {
            state_label: label.to_string(),
            state_category: category.to_string(),
            count,
        })
        .collect();
    pipeline.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.state_label.cmp(&b.state_label))
    });

    let mut costs: HashMap<&str, (usize, f64)> = HashMap::new();
    for row in &jobs {
        let category = row.deficiency_category.as_deref().unwrap_or("unknown");
        let entry = costs.entry(category).or_default();
        entry.0 += 1;
        if let Some(cost) = row.deficiency_total_cost {
            entry.1 += cost;
        }
    }
    let mut categories: Vec<CategoryCostItem> = costs
        .into_iter()
        .map(|(category, (count, total_cost))| CategoryCostItem {
            category: category.to_string(),
            count,
            total_cost: round_to(total_cost, 2),
            avg_cost: if count > 0 {
                round_to(total_cost / count as f64, 2)
            } else {
                0.0
            },
        })
        .collect();
    categories.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });

    CraftsmanResponse {
        overview,
        pipeline,
        categories,
    }
}

#[utoipa::path(
    get,
    path = "/api/craftsmen",
    params(FilterParams),
    responses(
        (status = 200, description = "Craftsman pipeline metrics", body = CraftsmanResponse),
        (status = 404, description = "No events in the selected window"),
    )
)]
pub(crate) async fn craftsman_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<CraftsmanResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let events = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if events.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_craftsman_report(&events)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/craftsmen", get(craftsman_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(state_label: &str, category: &str, cost: Option<f64>) -> EventRow {
        EventRow::from_value(&json!({
            "has_deficiency_report": true,
            "deficiency_state_label": state_label,
            "deficiency_state_category": "open",
            "deficiency_category": category,
            "deficiency_total_cost": cost,
        }))
    }

    #[test]
    fn completion_matches_labels_case_insensitively() {
        let events = vec![
            job("Reparatur ABGESCHLOSSEN", "Heizung", None),
            job("In Bearbeitung", "Heizung", None),
            // No report, stays out of the pipeline entirely.
            EventRow::from_value(&json!({ "has_deficiency_report": false })),
        ];
        let report = build_craftsman_report(&events);
        assert_eq!(report.overview.total_jobs, 2);
        assert_eq!(report.overview.completion_rate, 50.0);
    }

    #[test]
    fn self_repairs_and_assignments_count_separately() {
        let events = vec![
            EventRow::from_value(&json!({
                "has_deficiency_report": true,
                "resolution_method": "self_repaired",
            })),
            EventRow::from_value(&json!({
                "has_deficiency_report": true,
                "has_craftsman": true,
            })),
        ];
        let report = build_craftsman_report(&events);
        assert_eq!(report.overview.self_repair_count, 1);
        assert_eq!(report.overview.self_repair_rate, 50.0);
        assert_eq!(report.overview.craftsman_assigned_rate, 50.0);
    }

    #[test]
    fn categories_aggregate_costs() {
        let events = vec![
            job("open", "Heizung", Some(120.5)),
            job("open", "Heizung", Some(79.5)),
            job("open", "Fenster", None),
        ];
        let report = build_craftsman_report(&events);
        assert_eq!(report.categories[0].category, "Heizung");
        assert_eq!(report.categories[0].total_cost, 200.0);
        assert_eq!(report.categories[0].avg_cost, 100.0);
        assert_eq!(report.categories[1].total_cost, 0.0);
        assert_eq!(report.pipeline[0].count, 3);
    }
}
