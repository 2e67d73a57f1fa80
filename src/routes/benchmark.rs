//! Cross-brand comparison. The brand query parameter is deliberately
//! ignored here; comparing requires every brand.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::breakdown::{breakdown_of, BreakdownItem};
use crate::analytics::metrics::{avg_of, safe_percent};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandBenchmark {
    pub brand: String,
    pub total_events: usize,
    pub avg_quality_score: f64,
    pub automation_rate: f64,
    pub loop_rate: f64,
    pub bug_rate: f64,
    pub avg_first_response_sec: f64,
    pub avg_duration_min: f64,
    pub deficiency_report_rate: f64,
    pub sentiment_breakdown: Vec<BreakdownItem>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct BenchmarkResponse {
    pub benchmarks: Vec<BrandBenchmark>,
}

fn brand_benchmark(brand: &str, rows: &[&EventRow]) -> BrandBenchmark {
    let total = rows.len();
    let loop_count = rows.iter().filter(|r| r.ai_loop_detected).count();
    let bug_count = rows.iter().filter(|r| r.is_bug).count();
    let report_count = rows.iter().filter(|r| r.has_deficiency_report).count();

    BrandBenchmark {
        brand: brand.to_string(),
        total_events: total,
        avg_quality_score: avg_of(rows.iter().map(|r| r.ai_quality_score), 2),
        automation_rate: avg_of(rows.iter().map(|r| r.automation_rate), 2),
        loop_rate: safe_percent(loop_count as f64, total as f64, 1),
        bug_rate: safe_percent(bug_count as f64, total as f64, 1),
        avg_first_response_sec: avg_of(rows.iter().map(|r| r.first_response_sec), 2),
        avg_duration_min: avg_of(rows.iter().map(|r| r.duration_minutes), 2),
        deficiency_report_rate: safe_percent(report_count as f64, total as f64, 1),
        sentiment_breakdown: breakdown_of(
            rows.iter().map(|r| r.tenant_sentiment.as_deref()),
            total,
        ),
    }
}

pub(crate) fn build_benchmarks(events: &[EventRow]) -> Vec<BrandBenchmark> {
    let mut by_brand: HashMap<&str, Vec<&EventRow>> = HashMap::new();
    for row in events {
        by_brand
            .entry(row.brand.as_deref().unwrap_or("unknown"))
            .or_default()
            .push(row);
    }
    let mut benchmarks: Vec<BrandBenchmark> = by_brand
        .iter()
        .map(|(brand, rows)| brand_benchmark(brand, rows))
        .collect();
    benchmarks.sort_by(|a, b| {
        b.total_events
            .cmp(&a.total_events)
            .then_with(|| a.brand.cmp(&b.brand))
    });
    benchmarks
}

#[utoipa::path(
    get,
    path = "/api/benchmark",
    params(FilterParams),
    responses(
        (status = 200, description = "Per-brand KPI comparison", body = BenchmarkResponse),
        (status = 404, description = "No events in the selected window"),
    )
)]
pub(crate) async fn benchmark_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<BenchmarkResponse>> {
    let filters = DashboardFilters::from_params(&params).without_brand();
    let events = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if events.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(BenchmarkResponse {
        benchmarks: build_benchmarks(&events),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/benchmark", get(benchmark_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(brand: Option<&str>, quality: Option<f64>, is_bug: bool) -> EventRow {
        EventRow::from_value(&json!({
            "brand": brand,
            "ai_quality_score": quality,
            "is_bug": is_bug,
            "tenant_sentiment": "positive",
        }))
    }

    #[test]
    fn brands_sort_by_event_volume() {
        let events = vec![
            event(Some("novac"), Some(8.0), false),
            event(Some("novac"), Some(6.0), true),
            event(Some("alpina"), Some(9.0), false),
        ];
        let benchmarks = build_benchmarks(&events);
        assert_eq!(benchmarks.len(), 2);
        assert_eq!(benchmarks[0].brand, "novac");
        assert_eq!(benchmarks[0].total_events, 2);
        assert_eq!(benchmarks[0].avg_quality_score, 7.0);
        assert_eq!(benchmarks[0].bug_rate, 50.0);
        assert_eq!(benchmarks[1].brand, "alpina");
    }

    #[test]
    fn missing_brand_buckets_under_unknown() {
        let benchmarks = build_benchmarks(&[event(None, None, false)]);
        assert_eq!(benchmarks[0].brand, "unknown");
        // No scores present: averages fall back to zero, not NaN.
        assert_eq!(benchmarks[0].avg_quality_score, 0.0);
        assert_eq!(benchmarks[0].sentiment_breakdown[0].label, "positive");
    }
}
