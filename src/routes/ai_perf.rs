//! Operational performance KPIs: response times, SLA compliance, message
//! volumes, tenant adoption and effort.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::breakdown::{BreakdownCounter, BreakdownItem};
use crate::analytics::categories::DEFICIENCY_TYPES_V1;
use crate::analytics::metrics::{effort_score, safe_avg, safe_percent, upper_median};
use crate::analytics::sla::{self, SlaSummary};
use crate::analytics::timeseries::month_key;
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::EventRow;
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

/// First responses at or above this many seconds are treated as agent
/// handoffs, not assistant latency, and stay out of the median.
const MEDIAN_RESPONSE_CUTOFF_SEC: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionPoint {
    pub period: String,
    pub unique_tenants: usize,
    pub adoption_rate: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiPerfResponse {
    pub total_events: usize,
    pub avg_first_response_sec: f64,
    pub median_first_response_sec: f64,
    pub sla_compliance_rate: f64,
    pub sla_compliant: usize,
    pub sla_breached: usize,
    pub sla_at_risk: usize,
    pub false_success_count: usize,
    pub false_success_rate: f64,
    pub failed_report_count: usize,
    pub failed_report_rate: f64,
    pub total_messages: i64,
    pub avg_messages: f64,
    pub total_inbound: i64,
    pub total_ai_messages: i64,
    pub language_breakdown: Vec<BreakdownItem>,
    pub unique_tenants: usize,
    pub repeat_tenants: usize,
    pub repeat_tenant_rate: f64,
    pub ping_pong_rate: f64,
    pub avg_ping_pong: f64,
    pub max_ping_pong: i64,
    pub ping_pong_distribution: Vec<BreakdownItem>,
    pub avg_effort_score: f64,
    pub bug_count: usize,
    pub bug_rate: f64,
    pub bug_false_success: usize,
    pub bug_failed_report: usize,
    pub total_properties: usize,
    pub adoption_trend: Vec<AdoptionPoint>,
    pub current_adoption_rate: f64,
    pub avg_automation_rate: f64,
}

/// Fixed four-tier ping-pong histogram over rows that carry a count.
pub(crate) fn ping_pong_distribution(counts: &[i64]) -> Vec<BreakdownItem> {
    let total = counts.len();
    let bucket = |label: &str, count: usize| BreakdownItem {
        label: label.to_string(),
        count,
        percentage: safe_percent(count as f64, total as f64, 1),
    };
    vec![
        bucket("Normal (0-3)", counts.iter().filter(|&&c| c <= 3).count()),
        bucket(
            "Erhoeht (4-6)",
            counts.iter().filter(|&&c| c > 3 && c <= 6).count(),
        ),
        bucket(
            "Bedenklich (7-10)",
            counts.iter().filter(|&&c| c > 6 && c <= 10).count(),
        ),
        bucket("Loop (>10)", counts.iter().filter(|&&c| c > 10).count()),
    ]
}

pub(crate) fn build_ai_perf(
    rows: &[EventRow],
    sla: &SlaSummary,
    total_properties: usize,
) -> AiPerfResponse {
    let total = rows.len();

    let response_times: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.first_response_sec)
        .filter(|&v| v > 0.0)
        .collect();
    let avg_first_response_sec = safe_avg(
        response_times.iter().sum(),
        response_times.len() as f64,
        1,
    );
    let median_pool: Vec<f64> = response_times
        .iter()
        .copied()
        .filter(|&v| v < MEDIAN_RESPONSE_CUTOFF_SEC)
        .collect();
    let median_first_response_sec = upper_median(&median_pool);

    let false_success_count = rows.iter().filter(|r| r.bug_false_success).count();
    let failed_report_count = rows.iter().filter(|r| r.bug_failed_report).count();
    let bug_count = rows
        .iter()
        .filter(|r| r.bug_false_success || r.bug_failed_report)
        .count();

    let msg_rows: Vec<&EventRow> = rows.iter().filter(|r| r.message_count.is_some()).collect();
    let total_messages: i64 = msg_rows.iter().filter_map(|r| r.message_count).sum();
    let total_inbound: i64 = msg_rows.iter().filter_map(|r| r.inbound_count).sum();
    let total_ai_messages: i64 = msg_rows.iter().filter_map(|r| r.ai_count).sum();

    // Language shares are taken over the full event count even though
    // unlabelled rows are left out of the list.
    let mut language_counter = BreakdownCounter::new();
    for row in rows {
        if let Some(language) = row.language.as_deref() {
            language_counter.add_label(language);
        }
    }

    let mut tenant_counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        if let Some(phone) = row.phone_number.as_deref() {
            *tenant_counts.entry(phone).or_default() += 1;
        }
    }
    let unique_tenants = tenant_counts.len();
    let repeat_tenants = tenant_counts.values().filter(|&&c| c > 1).count();

    let ping_pong_counts: Vec<i64> = rows.iter().filter_map(|r| r.ping_pong_count).collect();
    let with_ping_pong = ping_pong_counts.iter().filter(|&&c| c > 0).count();
    let avg_ping_pong = safe_avg(
        ping_pong_counts.iter().sum::<i64>() as f64,
        ping_pong_counts.len() as f64,
        2,
    );
    let max_ping_pong = ping_pong_counts.iter().copied().max().unwrap_or(0);

    let effort_scores: Vec<f64> = rows
        .iter()
        .filter_map(|r| {
            let (Some(inbound), Some(duration), Some(ping_pong)) =
                (r.inbound_count, r.duration_minutes, r.ping_pong_count)
            else {
                return None;
            };
            Some(effort_score(
                inbound,
                duration,
                ping_pong,
                r.event_outcome.as_deref(),
            ))
        })
        .collect();
    let avg_effort_score = safe_avg(effort_scores.iter().sum(), effort_scores.len() as f64, 2);

    let mut monthly_adoption: HashMap<String, HashSet<&str>> = HashMap::new();
    for row in rows {
        if let (Some(started), Some(phone)) = (row.started_at, row.phone_number.as_deref()) {
            monthly_adoption
                .entry(month_key(started))
                .or_default()
                .insert(phone);
        }
    }
    let mut adoption_trend: Vec<AdoptionPoint> = monthly_adoption
        .into_iter()
        .map(|(period, tenants)| AdoptionPoint {
            period,
            unique_tenants: tenants.len(),
            adoption_rate: safe_percent(tenants.len() as f64, total_properties as f64, 1),
        })
        .collect();
    adoption_trend.sort_by(|a, b| a.period.cmp(&b.period));
    let current_adoption_rate = adoption_trend
        .last()
        .map(|point| point.adoption_rate)
        .unwrap_or(0.0);

    let automation_rates: Vec<f64> = rows.iter().filter_map(|r| r.automation_rate).collect();
    let avg_automation_rate = safe_avg(
        automation_rates.iter().sum(),
        automation_rates.len() as f64,
        3,
    );

    AiPerfResponse {
        total_events: total,
        avg_first_response_sec,
        median_first_response_sec,
        sla_compliance_rate: sla.compliance_rate,
        sla_compliant: sla.compliant,
        sla_breached: sla.breached,
        sla_at_risk: sla.at_risk,
        false_success_count,
        false_success_rate: safe_percent(false_success_count as f64, total as f64, 1),
        failed_report_count,
        failed_report_rate: safe_percent(failed_report_count as f64, total as f64, 1),
        total_messages,
        avg_messages: safe_avg(total_messages as f64, msg_rows.len() as f64, 1),
        total_inbound,
        total_ai_messages,
        language_breakdown: language_counter.into_breakdown(total),
        unique_tenants,
        repeat_tenants,
        repeat_tenant_rate: safe_percent(repeat_tenants as f64, unique_tenants as f64, 1),
        ping_pong_rate: safe_percent(with_ping_pong as f64, ping_pong_counts.len() as f64, 1),
        avg_ping_pong,
        max_ping_pong,
        ping_pong_distribution: ping_pong_distribution(&ping_pong_counts),
        avg_effort_score,
        bug_count,
        bug_rate: safe_percent(bug_count as f64, total as f64, 1),
        bug_false_success: false_success_count,
        bug_failed_report: failed_report_count,
        total_properties,
        adoption_trend,
        current_adoption_rate,
        avg_automation_rate,
    }
}

#[utoipa::path(
    get,
    path = "/api/ai-perf",
    params(FilterParams),
    responses(
        (status = 200, description = "Operational performance KPIs", body = AiPerfResponse),
        (status = 404, description = "No events match the filters"),
    )
)]
pub(crate) async fn ai_perf_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<AiPerfResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (rows, hierarchy, deficiencies, configs) = try_join!(
        fetch::events(&data, &filters),
        fetch::hierarchy(&data),
        fetch::deficiencies(&data),
        fetch::company_configs(&data),
    )
    .map_err(ApiError::fetch)?;
    if rows.is_empty() {
        return Err(ApiError::no_data());
    }

    let enriched = hierarchy.enrich_filtered(&deficiencies, &filters);
    let sla_summary = sla::evaluate(&enriched, &configs, &DEFICIENCY_TYPES_V1);
    let total_properties = hierarchy.unit_count(filters.brand.as_deref());

    Ok(Json(build_ai_perf(&rows, &sla_summary, total_properties)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ai-perf", get(ai_perf_handler))
}
