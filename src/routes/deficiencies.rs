//! Maintenance ticket KPIs: categories, lifecycle states, closing times.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::breakdown::{BreakdownCounter, BreakdownItem};
use crate::analytics::categories::{CLOSING_STATES, DEFICIENCY_TYPES_V1, STATE_LABELS_V1, TERMINAL_STATES};
use crate::analytics::hierarchy::EnrichedDeficiency;
use crate::analytics::metrics::{round_to, safe_avg, safe_percent};
use crate::analytics::timeseries::{counts_to_series, month_key, quarter_key, year_key, PeriodCount};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosingTimeEntry {
    pub state: i64,
    pub state_label: String,
    pub count: usize,
    pub avg_days: f64,
    pub min_days: f64,
    pub max_days: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateBreakdownItem {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub state_id: i64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeficiencyResponse {
    pub total_deficiencies: usize,
    pub solved_count: usize,
    pub solved_percent: f64,
    pub category_breakdown: Vec<BreakdownItem>,
    pub monthly_trend: Vec<PeriodCount>,
    pub quarterly_trend: Vec<PeriodCount>,
    pub yearly_trend: Vec<PeriodCount>,
    pub closing_time_summary: Vec<ClosingTimeEntry>,
    pub overall_avg_closing_days: f64,
    pub state_breakdown: Vec<StateBreakdownItem>,
}

pub(crate) fn build_deficiency_report(enriched: &[EnrichedDeficiency]) -> DeficiencyResponse {
    let total = enriched.len();

    let mut category_counter = BreakdownCounter::new();
    for item in enriched {
        for label in DEFICIENCY_TYPES_V1.decode(item.deficiency.type_bits) {
            category_counter.add_label(label);
        }
    }

    let solved_count = enriched
        .iter()
        .filter(|item| TERMINAL_STATES.contains(&item.deficiency.state))
        .count();

    let mut monthly: HashMap<String, usize> = HashMap::new();
    let mut quarterly: HashMap<String, usize> = HashMap::new();
    let mut yearly: HashMap<String, usize> = HashMap::new();
    for item in enriched {
        // enrich_filtered only admits tickets with a creation timestamp.
        let Some(added) = item.deficiency.time_added else {
            continue;
        };
        *monthly.entry(month_key(added)).or_default() += 1;
        *quarterly.entry(quarter_key(added)).or_default() += 1;
        *yearly.entry(year_key(added)).or_default() += 1;
    }

    // Closing time per terminal state, in days between creation and the
    // final follow-up; clock skew can make that negative, clamp at zero.
    let mut closing_by_state: HashMap<i64, Vec<f64>> = HashMap::new();
    for item in enriched {
        if !CLOSING_STATES.contains(&item.deficiency.state) {
            continue;
        }
        let (Some(added), Some(follow_up)) =
            (item.deficiency.time_added, item.deficiency.valid_follow_up())
        else {
            continue;
        };
        let days = ((follow_up - added).num_milliseconds() as f64 / 86_400_000.0).max(0.0);
        closing_by_state
            .entry(item.deficiency.state)
            .or_default()
            .push(days);
    }
    let mut closing_time_summary: Vec<ClosingTimeEntry> = closing_by_state
        .iter()
        .map(|(&state, days)| ClosingTimeEntry {
            state,
            state_label: STATE_LABELS_V1.label(state),
            count: days.len(),
            avg_days: safe_avg(days.iter().sum(), days.len() as f64, 1),
            min_days: round_to(days.iter().copied().fold(f64::INFINITY, f64::min), 1),
            max_days: round_to(days.iter().copied().fold(f64::NEG_INFINITY, f64::max), 1),
        })
        .collect();
    closing_time_summary.sort_by_key(|entry| entry.state);

    let all_days: Vec<f64> = closing_by_state.values().flatten().copied().collect();
    let overall_avg_closing_days = safe_avg(all_days.iter().sum(), all_days.len() as f64, 1);

    let mut state_counts: HashMap<i64, usize> = HashMap::new();
    for item in enriched {
        *state_counts.entry(item.deficiency.state).or_default() += 1;
    }
    let mut state_breakdown: Vec<StateBreakdownItem> = state_counts
        .into_iter()
        .map(|(state, count)| StateBreakdownItem {
            label: STATE_LABELS_V1.label(state),
            count,
            percentage: safe_percent(count as f64, total as f64, 1),
            state_id: state,
        })
        .collect();
    state_breakdown.sort_by_key(|item| item.state_id);

    DeficiencyResponse {
        total_deficiencies: total,
        solved_count,
        solved_percent: safe_percent(solved_count as f64, total as f64, 1),
        category_breakdown: category_counter.into_breakdown(total),
        monthly_trend: counts_to_series(monthly),
        quarterly_trend: counts_to_series(quarterly),
        yearly_trend: counts_to_series(yearly),
        closing_time_summary,
        overall_avg_closing_days,
        state_breakdown,
    }
}

#[utoipa::path(
    get,
    path = "/api/deficiencies",
    params(FilterParams),
    responses(
        (status = 200, description = "Maintenance ticket KPIs", body = DeficiencyResponse),
    )
)]
pub(crate) async fn deficiency_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<DeficiencyResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (hierarchy, deficiencies) = try_join!(fetch::hierarchy(&data), fetch::deficiencies(&data))
        .map_err(ApiError::fetch)?;
    let enriched = hierarchy.enrich_filtered(&deficiencies, &filters);
    Ok(Json(build_deficiency_report(&enriched)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/deficiencies", get(deficiency_handler))
}
