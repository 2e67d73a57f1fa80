//! Weekly trend series over the core conversation KPIs.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::analytics::timeseries::weekly_buckets;
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendDataPoint {
    pub period: String,
    pub count: usize,
    pub avg_quality: f64,
    pub loop_rate: f64,
    pub bug_rate: f64,
    pub automation_rate: f64,
    pub deficiency_report_rate: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct TrendsResponse {
    pub trends: Vec<TrendDataPoint>,
}

pub(crate) fn build_trends(rows: &[EventRow]) -> TrendsResponse {
    let trends = weekly_buckets(rows)
        .into_iter()
        .map(|(period, bucket)| TrendDataPoint {
            period,
            count: bucket.count,
            avg_quality: bucket.avg_quality(),
            loop_rate: bucket.loop_rate(),
            bug_rate: bucket.bug_rate(),
            automation_rate: bucket.automation_rate(),
            deficiency_report_rate: bucket.deficiency_report_rate(),
        })
        .collect();
    TrendsResponse { trends }
}

#[utoipa::path(
    get,
    path = "/api/trends",
    params(FilterParams),
    responses(
        (status = 200, description = "Per-week KPI trend points", body = TrendsResponse),
        (status = 404, description = "No events match the filters"),
    )
)]
pub(crate) async fn trends_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<TrendsResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let rows = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if rows.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_trends(&rows)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/trends", get(trends_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trend_points_sort_by_week_and_carry_rates() {
        let rows = vec![
            EventRow::from_value(&json!({
                "started_at": "2026-01-12T10:00:00Z",
                "ai_quality_score": 9.0,
                "is_bug": true,
            })),
            EventRow::from_value(&json!({
                "started_at": "2026-01-05T10:00:00Z",
                "ai_quality_score": 7.0,
                "has_deficiency_report": true,
            })),
        ];
        let response = build_trends(&rows);
        assert_eq!(response.trends.len(), 2);
        assert_eq!(response.trends[0].period, "2026-W02");
        assert_eq!(response.trends[0].deficiency_report_rate, 100.0);
        assert_eq!(response.trends[1].period, "2026-W03");
        assert_eq!(response.trends[1].bug_rate, 100.0);
    }
}
