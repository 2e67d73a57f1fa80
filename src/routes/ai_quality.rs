//! Assistant answer-quality KPIs and their weekly trend.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::breakdown::{breakdown_of, BreakdownItem};
use crate::analytics::metrics::{avg_of, safe_avg, safe_percent};
use crate::analytics::timeseries::{iso_week_key, TimeSeriesPoint};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiQualityResponse {
    pub avg_quality_score: f64,
    pub quality_score_distribution: Vec<BreakdownItem>,
    pub loop_rate: f64,
    pub loop_count: usize,
    pub misunderstanding_rate: f64,
    pub misunderstanding_count: usize,
    pub correct_triage_rate: f64,
    pub avg_unnecessary_questions: f64,
    pub sentiment_breakdown: Vec<BreakdownItem>,
    pub resolution_breakdown: Vec<BreakdownItem>,
    pub quality_trend: Vec<TimeSeriesPoint>,
}

pub(crate) fn build_ai_quality(rows: &[EventRow]) -> AiQualityResponse {
    let total = rows.len();

    let loop_count = rows.iter().filter(|r| r.ai_loop_detected).count();
    let misunderstanding_count = rows.iter().filter(|r| r.ai_misunderstood).count();
    let correct_triage_count = rows.iter().filter(|r| r.ai_correct_triage).count();

    let score_labels: Vec<Option<String>> = rows
        .iter()
        .map(|r| {
            r.ai_quality_score
                .map(|score| format!("{}", score.round() as i64))
        })
        .collect();

    // Weekly average quality; weeks where no row carries a score still
    // appear, at value 0.
    let mut week_map: HashMap<String, (f64, usize)> = HashMap::new();
    for row in rows {
        let Some(started) = row.started_at else {
            continue;
        };
        let entry = week_map.entry(iso_week_key(started)).or_insert((0.0, 0));
        if let Some(score) = row.ai_quality_score {
            entry.0 += score;
            entry.1 += 1;
        }
    }
    let mut quality_trend: Vec<TimeSeriesPoint> = week_map
        .into_iter()
        .map(|(period, (sum, count))| TimeSeriesPoint {
            period,
            value: safe_avg(sum, count as f64, 2),
        })
        .collect();
    quality_trend.sort_by(|a, b| a.period.cmp(&b.period));

    AiQualityResponse {
        avg_quality_score: avg_of(rows.iter().map(|r| r.ai_quality_score), 2),
        quality_score_distribution: breakdown_of(
            score_labels.iter().map(|label| label.as_deref()),
            total,
        ),
        loop_rate: safe_percent(loop_count as f64, total as f64, 1),
        loop_count,
        misunderstanding_rate: safe_percent(misunderstanding_count as f64, total as f64, 1),
        misunderstanding_count,
        correct_triage_rate: safe_percent(correct_triage_count as f64, total as f64, 1),
        avg_unnecessary_questions: avg_of(rows.iter().map(|r| r.ai_unnecessary_questions), 2),
        sentiment_breakdown: breakdown_of(rows.iter().map(|r| r.tenant_sentiment.as_deref()), total),
        resolution_breakdown: breakdown_of(
            rows.iter().map(|r| r.resolution_method.as_deref()),
            total,
        ),
        quality_trend,
    }
}

#[utoipa::path(
    get,
    path = "/api/ai-quality",
    params(FilterParams),
    responses(
        (status = 200, description = "Answer-quality KPIs", body = AiQualityResponse),
        (status = 404, description = "No events match the filters"),
    )
)]
pub(crate) async fn ai_quality_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<AiQualityResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let rows = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if rows.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_ai_quality(&rows)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ai-quality", get(ai_quality_handler))
}
