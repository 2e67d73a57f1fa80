//! OpenAPI document for the dashboard API, served at `/api/openapi.json`
//! and printable via `--print-openapi`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "kpi-server-rs",
        description = "KPI reporting API for the tenant assistant dashboard"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::summary::summary_handler,
        crate::routes::trends::trends_handler,
        crate::routes::ai_quality::ai_quality_handler,
        crate::routes::ai_perf::ai_perf_handler,
        crate::routes::deficiencies::deficiency_handler,
        crate::routes::bugs::bug_summary_handler,
        crate::routes::review::review_stats_handler,
        crate::routes::escalations::escalations_handler,
        crate::routes::craftsmen::craftsman_handler,
        crate::routes::properties::properties_handler,
        crate::routes::reports::reports_handler,
        crate::routes::sentiment::sentiment_handler,
        crate::routes::benchmark::benchmark_handler,
        crate::routes::insights::insights_handler,
        crate::routes::roi::roi_handler,
    ),
    components(schemas(
        crate::analytics::breakdown::BreakdownItem,
        crate::analytics::sentiment::SentimentTransition,
        crate::analytics::timeseries::PeriodCount,
        crate::analytics::timeseries::TimeSeriesPoint,
        crate::routes::health::HealthResponse,
        crate::routes::summary::SummaryResponse,
        crate::routes::trends::TrendDataPoint,
        crate::routes::trends::TrendsResponse,
        crate::routes::ai_quality::AiQualityResponse,
        crate::routes::ai_perf::AdoptionPoint,
        crate::routes::ai_perf::AiPerfResponse,
        crate::routes::deficiencies::ClosingTimeEntry,
        crate::routes::deficiencies::StateBreakdownItem,
        crate::routes::deficiencies::DeficiencyResponse,
        crate::routes::bugs::BugSummaryResponse,
        crate::routes::review::ReviewStatsResponse,
        crate::routes::escalations::BuildingEscalation,
        crate::routes::escalations::EscalationsResponse,
        crate::routes::craftsmen::CraftsmanOverview,
        crate::routes::craftsmen::PipelineItem,
        crate::routes::craftsmen::CategoryCostItem,
        crate::routes::craftsmen::CraftsmanResponse,
        crate::routes::properties::BuildingStats,
        crate::routes::properties::OwnerStats,
        crate::routes::properties::SeverityCell,
        crate::routes::properties::PropertiesResponse,
        crate::routes::reports::TenantReportCount,
        crate::routes::reports::ReportsResponse,
        crate::routes::sentiment::SentimentResponse,
        crate::routes::benchmark::BrandBenchmark,
        crate::routes::benchmark::BenchmarkResponse,
        crate::routes::insights::InsightsResponse,
        crate::routes::roi::CategorySavings,
        crate::routes::roi::RoiResponse,
    ))
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    // The derive produces a valid document; serialization cannot fail.
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|_| serde_json::json!({}))
}

pub(crate) async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().unwrap();
        for expected in [
            "/healthz",
            "/api/summary",
            "/api/trends",
            "/api/ai-quality",
            "/api/ai-perf",
            "/api/deficiencies",
            "/api/bugs/summary",
            "/api/review/stats",
            "/api/escalations",
            "/api/craftsmen",
            "/api/properties",
            "/api/reports",
            "/api/sentiment",
            "/api/benchmark",
            "/api/insights",
            "/api/roi",
        ] {
            assert!(paths.contains_key(expected), "missing {expected}");
        }
    }

    #[test]
    fn filter_params_are_documented_on_summary() {
        let doc = openapi_json();
        let params = doc["paths"]["/api/summary"]["get"]["parameters"]
            .as_array()
            .unwrap();
        let names: Vec<&str> = params
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(names.contains(&"dateFrom"));
        assert!(names.contains(&"dateTo"));
        assert!(names.contains(&"brand"));
    }
}
