//! Bug statistics over the flagged conversation events.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::breakdown::{breakdown_of, BreakdownItem};
use crate::analytics::metrics::safe_percent;
use crate::analytics::timeseries::{iso_week_key, TimeSeriesPoint};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BugSummaryResponse {
    pub total_bugs: usize,
    pub bug_rate: f64,
    pub category_breakdown: Vec<BreakdownItem>,
    pub status_breakdown: Vec<BreakdownItem>,
    pub unreviewed_count: usize,
    pub bug_trend: Vec<TimeSeriesPoint>,
    pub reproducibility_breakdown: Vec<BreakdownItem>,
}

pub(crate) fn build_bug_summary(rows: &[EventRow]) -> BugSummaryResponse {
    let total = rows.len();
    let bugs: Vec<&EventRow> = rows.iter().filter(|r| r.is_bug).collect();
    let total_bugs = bugs.len();

    let unreviewed_count = bugs.iter().filter(|r| r.bug_reviewed_at.is_none()).count();

    let mut week_map: HashMap<String, usize> = HashMap::new();
    for bug in &bugs {
        let Some(started) = bug.started_at else {
            continue;
        };
        *week_map.entry(iso_week_key(started)).or_insert(0) += 1;
    }
    let mut bug_trend: Vec<TimeSeriesPoint> = week_map
        .into_iter()
        .map(|(period, count)| TimeSeriesPoint {
            period,
            value: count as f64,
        })
        .collect();
    bug_trend.sort_by(|a, b| a.period.cmp(&b.period));

    BugSummaryResponse {
        total_bugs,
        bug_rate: safe_percent(total_bugs as f64, total as f64, 1),
        category_breakdown: breakdown_of(
            bugs.iter().map(|r| r.bug_category.as_deref()),
            total_bugs,
        ),
        status_breakdown: breakdown_of(
            bugs.iter().map(|r| r.review_status.as_deref()),
            total_bugs,
        ),
        unreviewed_count,
        bug_trend,
        reproducibility_breakdown: breakdown_of(
            bugs.iter().map(|r| r.bug_reproducible.as_deref()),
            total_bugs,
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/bugs/summary",
    params(FilterParams),
    responses(
        (status = 200, description = "Bug KPIs and their weekly trend", body = BugSummaryResponse),
        (status = 404, description = "No events match the filters"),
    )
)]
pub(crate) async fn bug_summary_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<BugSummaryResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let rows = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if rows.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_bug_summary(&rows)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/bugs/summary", get(bug_summary_handler))
}
