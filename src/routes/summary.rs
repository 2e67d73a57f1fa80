//! Main overview endpoint with the aggregate KPIs and their breakdowns.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
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
pub struct SummaryResponse {
    pub total_events: usize,
    pub total_with_deficiency_report: usize,
    pub deficiency_report_rate: f64,
    pub avg_ai_quality_score: f64,
    pub avg_tenant_effort: f64,
    pub loop_detection_rate: f64,
    pub misunderstanding_rate: f64,
    pub bug_rate: f64,
    pub correct_triage_rate: f64,
    pub avg_unnecessary_questions: f64,
    pub urgency_rate: f64,
    pub automation_rate: f64,
    pub avg_first_response_sec: f64,
    pub avg_duration_min: f64,
    pub avg_time_to_report_sec: Option<f64>,
    pub agent_takeover_rate: f64,
    pub sentiment_breakdown: Vec<BreakdownItem>,
    pub severity_breakdown: Vec<BreakdownItem>,
    pub category_breakdown: Vec<BreakdownItem>,
    pub resolution_breakdown: Vec<BreakdownItem>,
    pub intent_breakdown: Vec<BreakdownItem>,
    pub outcome_breakdown: Vec<BreakdownItem>,
    pub inquiry_type_breakdown: Vec<BreakdownItem>,
    pub state_breakdown: Vec<BreakdownItem>,
    pub language_breakdown: Vec<BreakdownItem>,
    pub sla_breakdown: Vec<BreakdownItem>,
    pub quality_score_distribution: Vec<BreakdownItem>,
    pub effort_score_distribution: Vec<BreakdownItem>,
    pub top_topics: Vec<BreakdownItem>,
    pub business_hours_breakdown: Vec<BreakdownItem>,
    pub day_of_week_breakdown: Vec<BreakdownItem>,
    pub hour_of_day_breakdown: Vec<BreakdownItem>,
}

fn count_true(rows: &[EventRow], field: impl Fn(&EventRow) -> bool) -> usize {
    rows.iter().filter(|row| field(row)).count()
}

/// Bucket label for a 0-10 score, rounded to the nearest integer.
fn score_bucket(score: Option<f64>) -> Option<String> {
    score.map(|value| format!("{}", value.round() as i64))
}

fn numeric_bucket(value: Option<i64>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub(crate) fn build_summary(rows: &[EventRow]) -> SummaryResponse {
    let total = rows.len();

    let with_report = count_true(rows, |r| r.has_deficiency_report);
    let loop_count = count_true(rows, |r| r.ai_loop_detected);
    let misunderstanding_count = count_true(rows, |r| r.ai_misunderstood);
    let bug_count = count_true(rows, |r| r.is_bug);
    let correct_triage_count = count_true(rows, |r| r.ai_correct_triage);
    let urgent_count = count_true(rows, |r| r.is_urgent);
    let agent_takeover_count = count_true(rows, |r| r.has_agent_takeover);

    let avg_time_to_report = avg_of(rows.iter().map(|r| r.time_to_report_sec), 2);

    let buckets = |labels: Vec<Option<String>>| -> Vec<BreakdownItem> {
        breakdown_of(labels.iter().map(|l| l.as_deref()), total)
    };

    SummaryResponse {
        total_events: total,
        total_with_deficiency_report: with_report,
        deficiency_report_rate: safe_percent(with_report as f64, total as f64, 1),
        avg_ai_quality_score: avg_of(rows.iter().map(|r| r.ai_quality_score), 2),
        avg_tenant_effort: avg_of(rows.iter().map(|r| r.tenant_effort_score), 2),
        loop_detection_rate: safe_percent(loop_count as f64, total as f64, 1),
        misunderstanding_rate: safe_percent(misunderstanding_count as f64, total as f64, 1),
        bug_rate: safe_percent(bug_count as f64, total as f64, 1),
        correct_triage_rate: safe_percent(correct_triage_count as f64, total as f64, 1),
        avg_unnecessary_questions: avg_of(rows.iter().map(|r| r.ai_unnecessary_questions), 2),
        urgency_rate: safe_percent(urgent_count as f64, total as f64, 1),
        automation_rate: avg_of(rows.iter().map(|r| r.automation_rate), 2),
        avg_first_response_sec: avg_of(rows.iter().map(|r| r.first_response_sec), 2),
        avg_duration_min: avg_of(rows.iter().map(|r| r.duration_minutes), 2),
        // The base view only carries a report time for a minority of rows;
        // an all-missing window reports null rather than a fake zero.
        avg_time_to_report_sec: (avg_time_to_report != 0.0).then_some(avg_time_to_report),
        agent_takeover_rate: safe_percent(agent_takeover_count as f64, total as f64, 1),
        sentiment_breakdown: breakdown_of(
            rows.iter().map(|r| r.tenant_sentiment.as_deref()),
            total,
        ),
        severity_breakdown: breakdown_of(
            rows.iter().map(|r| r.estimated_severity.as_deref()),
            total,
        ),
        category_breakdown: breakdown_of(
            rows.iter().map(|r| r.deficiency_category.as_deref()),
            total,
        ),
        resolution_breakdown: breakdown_of(
            rows.iter().map(|r| r.resolution_method.as_deref()),
            total,
        ),
        intent_breakdown: breakdown_of(rows.iter().map(|r| r.intent.as_deref()), total),
        outcome_breakdown: breakdown_of(rows.iter().map(|r| r.event_outcome.as_deref()), total),
        inquiry_type_breakdown: breakdown_of(rows.iter().map(|r| r.inquiry_type.as_deref()), total),
        state_breakdown: breakdown_of(
            rows.iter()
                .map(|r| Some(r.deficiency_state_label.as_deref().unwrap_or("Kein Mangel"))),
            total,
        ),
        language_breakdown: breakdown_of(rows.iter().map(|r| r.language.as_deref()), total),
        sla_breakdown: breakdown_of(rows.iter().map(|r| r.sla_compliance.as_deref()), total),
        quality_score_distribution: buckets(
            rows.iter().map(|r| score_bucket(r.ai_quality_score)).collect(),
        ),
        effort_score_distribution: buckets(
            rows.iter()
                .map(|r| score_bucket(r.tenant_effort_score))
                .collect(),
        ),
        top_topics: breakdown_of(rows.iter().map(|r| r.topic_label.as_deref()), total),
        business_hours_breakdown: breakdown_of(
            rows.iter().map(|r| match r.is_inside_hours {
                Some(true) => Some("inside"),
                Some(false) => Some("outside"),
                None => None,
            }),
            total,
        ),
        day_of_week_breakdown: buckets(rows.iter().map(|r| numeric_bucket(r.started_dow)).collect()),
        hour_of_day_breakdown: buckets(
            rows.iter()
                .map(|r| numeric_bucket(r.started_hour_cet))
                .collect(),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/summary",
    params(FilterParams),
    responses(
        (status = 200, description = "Aggregate KPIs for the filtered window", body = SummaryResponse),
        (status = 404, description = "No events match the filters"),
    )
)]
pub(crate) async fn summary_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<SummaryResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let rows = fetch::events(&data, &filters)
        .await
        .map_err(ApiError::fetch)?;
    if rows.is_empty() {
        return Err(ApiError::no_data());
    }
    Ok(Json(build_summary(&rows)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<EventRow> {
        vec![
            EventRow::from_value(&json!({
                "started_at": "2026-01-05T10:00:00Z",
                "has_deficiency_report": true,
                "ai_quality_score": 8.4,
                "tenant_sentiment": "satisfied",
                "deficiency_state_label": "Gemeldet",
                "is_inside_hours": true,
                "started_dow": 1,
            })),
            EventRow::from_value(&json!({
                "started_at": "2026-01-06T22:00:00Z",
                "ai_loop_detected": true,
                "ai_quality_score": 5.6,
                "tenant_sentiment": "frustrated",
                "is_inside_hours": false,
                "started_dow": 2,
            })),
        ]
    }

    #[test]
    fn rates_and_averages_cover_the_whole_set() {
        let summary = build_summary(&rows());
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.total_with_deficiency_report, 1);
        assert_eq!(summary.deficiency_report_rate, 50.0);
        assert_eq!(summary.loop_detection_rate, 50.0);
        assert_eq!(summary.avg_ai_quality_score, 7.0);
        assert_eq!(summary.avg_time_to_report_sec, None);
    }

    #[test]
    fn missing_state_label_buckets_as_kein_mangel() {
        let summary = build_summary(&rows());
        let labels: Vec<&str> = summary
            .state_breakdown
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert!(labels.contains(&"Gemeldet"));
        assert!(labels.contains(&"Kein Mangel"));
    }

    #[test]
    fn quality_scores_bucket_to_rounded_integers() {
        let summary = build_summary(&rows());
        let labels: Vec<&str> = summary
            .quality_score_distribution
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert!(labels.contains(&"8"));
        assert!(labels.contains(&"6"));
    }

    #[test]
    fn business_hours_bucket_inside_and_outside() {
        let summary = build_summary(&rows());
        let labels: Vec<&str> = summary
            .business_hours_breakdown
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert!(labels.contains(&"inside"));
        assert!(labels.contains(&"outside"));
    }
}
