//! Inquiry timing patterns: business-hours split, day-of-week and
//! hour-of-day distributions, peak slots.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::analytics::breakdown::{breakdown_of, BreakdownItem};
use crate::analytics::metrics::safe_percent;
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    pub inside_hours_count: usize,
    pub outside_hours_count: usize,
    pub inside_hours_rate: f64,
    /// Weekday index as a string, "unknown" when no event carries one.
    pub peak_day: String,
    pub peak_hour: i64,
    pub day_of_week_breakdown: Vec<BreakdownItem>,
    pub hour_of_day_breakdown: Vec<BreakdownItem>,
}

fn peak_label(items: &[BreakdownItem]) -> Option<&str> {
    // Breakdowns come back count-descending with stable ties, so the first
    // entry is the peak slot. That can be the "unknown" bucket.
    items.first().map(|item| item.label.as_str())
}

pub(crate) fn build_insights(events: &[EventRow]) -> InsightsResponse {
    let total = events.len();
    let inside_hours_count = events
        .iter()
        .filter(|r| r.is_inside_hours == Some(true))
        .count();
    let outside_hours_count = events
        .iter()
        .filter(|r| r.is_inside_hours == Some(false))
        .count();

    let day_of_week_breakdown = breakdown_of(
        events
            .iter()
            .map(|r| r.started_dow.map(|d| d.to_string()))
            .collect::<Vec<_>>()
            .iter()
            .map(Option::as_deref),
        total,
    );
    let hour_of_day_breakdown = breakdown_of(
        events
            .iter()
            .map(|r| r.started_hour_cet.map(|h| h.to_string()))
            .collect::<Vec<_>>()
            .iter()
            .map(Option::as_deref),
        total,
    );

    let peak_day = peak_label(&day_of_week_breakdown)
        .unwrap_or("unknown")
        .to_string();
    let peak_hour = peak_label(&hour_of_day_breakdown)
        .and_then(|label| label.parse().ok())
        .unwrap_or(0);

    InsightsResponse {
        inside_hours_count,
        outside_hours_count,
        inside_hours_rate: safe_percent(inside_hours_count as f64, total as f64, 1),
        peak_day,
        peak_hour,
        day_of_week_breakdown,
        hour_of_day_breakdown,
    }
}

#[utoipa::path(
    get,
    path = "/api/insights",
    params(FilterParams),
    responses(
        (status = 200, description = "Inquiry timing patterns", body = InsightsResponse),
        (status = 404, description = "No events in the selected window"),
    )
)]
pub(crate) async fn insights_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<InsightsResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let events = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if events.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_insights(&events)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/insights", get(insights_handler))
}
