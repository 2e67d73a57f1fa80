//! Review-queue statistics and reviewer correction KPIs.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::breakdown::{breakdown_of, BreakdownItem};
use crate::analytics::metrics::safe_percent;
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::{CorrectionRow, EventRow};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatsResponse {
    pub pending_reviews: usize,
    pub auto_approved: usize,
    pub total_corrections: usize,
    pub corrections_by_field: Vec<BreakdownItem>,
    pub incorporation_rate: f64,
}

pub(crate) fn build_review_stats(
    rows: &[EventRow],
    corrections: &[CorrectionRow],
) -> ReviewStatsResponse {
    let pending_reviews = rows
        .iter()
        .filter(|r| r.review_status.as_deref() == Some("pending_review"))
        .count();
    let auto_approved = rows
        .iter()
        .filter(|r| r.review_status.as_deref() == Some("auto_approved"))
        .count();

    let total_corrections = corrections.len();
    let incorporated = corrections
        .iter()
        .filter(|c| c.status.as_deref() == Some("incorporated"))
        .count();

    ReviewStatsResponse {
        pending_reviews,
        auto_approved,
        total_corrections,
        corrections_by_field: breakdown_of(
            corrections.iter().map(|c| c.field_corrected.as_deref()),
            total_corrections,
        ),
        incorporation_rate: safe_percent(incorporated as f64, total_corrections as f64, 1),
    }
}

#[utoipa::path(
    get,
    path = "/api/review/stats",
    params(FilterParams),
    responses(
        (status = 200, description = "Review-queue and correction KPIs", body = ReviewStatsResponse),
    )
)]
pub(crate) async fn review_stats_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<ReviewStatsResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (rows, corrections) = try_join!(fetch::events(&data, &filters), fetch::corrections(&data))
        .map_err(ApiError::fetch)?;
    Ok(Json(build_review_stats(&rows, &corrections)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/review/stats", get(review_stats_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_status_counts_split_pending_and_auto_approved() {
        let rows = vec![
            EventRow::from_value(&json!({ "review_status": "pending_review" })),
            EventRow::from_value(&json!({ "review_status": "pending_review" })),
            EventRow::from_value(&json!({ "review_status": "auto_approved" })),
            EventRow::from_value(&json!({})),
        ];
        let response = build_review_stats(&rows, &[]);
        assert_eq!(response.pending_reviews, 2);
        assert_eq!(response.auto_approved, 1);
        assert_eq!(response.total_corrections, 0);
        assert_eq!(response.incorporation_rate, 0.0);
    }

    #[test]
    fn corrections_break_down_by_field_with_incorporation_rate() {
        let corrections = vec![
            CorrectionRow::from_value(&json!({
                "field_corrected": "bug_category",
                "status": "incorporated",
            })),
            CorrectionRow::from_value(&json!({
                "field_corrected": "bug_category",
                "status": "open",
            })),
            CorrectionRow::from_value(&json!({
                "field_corrected": "tenant_sentiment",
                "status": "incorporated",
            })),
        ];
        let response = build_review_stats(&[], &corrections);
        assert_eq!(response.total_corrections, 3);
        assert_eq!(response.corrections_by_field[0].label, "bug_category");
        assert_eq!(response.corrections_by_field[0].count, 2);
        assert_eq!(response.incorporation_rate, 66.7);
    }

    #[test]
    fn empty_inputs_yield_zeroes_not_an_error() {
        let response = build_review_stats(&[], &[]);
        assert_eq!(response.pending_reviews, 0);
        assert_eq!(response.auto_approved, 0);
        assert!(response.corrections_by_field.is_empty());
    }
}
