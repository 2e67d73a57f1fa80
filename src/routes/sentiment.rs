//! Sentiment arcs across repeat tenants, plus the craftsman mail volume
//! that results from deficiency reports.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::breakdown::{BreakdownCounter, BreakdownItem};
use crate::analytics::metrics::safe_percent;
use crate::analytics::sentiment::{analyze_arcs, SentimentTransition};
use crate::analytics::timeseries::{counts_to_series, month_key, PeriodCount};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::{Craftsman, Deficiency, EventRow};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

const COMPANY_LIMIT: usize = 20;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResponse {
    pub positive_to_negative: usize,
    pub positive_to_negative_rate: f64,
    pub negative_to_positive: usize,
    pub negative_to_positive_rate: f64,
    pub total_multi_event_tenants: usize,
    pub sentiment_transitions: Vec<SentimentTransition>,
    pub reports_generated: usize,
    pub reports_sent: usize,
    pub unique_craftsmen: usize,
    pub total_craftsmen: usize,
    pub craftsman_breakdown: Vec<BreakdownItem>,
    pub trade_breakdown: Vec<BreakdownItem>,
    pub monthly_mail_volume: Vec<PeriodCount>,
}

/// A report body shorter than this is an empty template, not a real report.
const MIN_REPORT_LENGTH: usize = 5;

fn has_report(deficiency: &Deficiency) -> bool {
    deficiency
        .report_body
        .as_deref()
        .is_some_and(|body| body.len() > MIN_REPORT_LENGTH)
}

pub(crate) fn build_sentiment(
    events: &[EventRow],
    deficiencies: &[Deficiency],
    craftsmen: &[Craftsman],
) -> SentimentResponse {
    let arcs = analyze_arcs(events);

    let craftsman_map: HashMap<&str, &Craftsman> =
        craftsmen.iter().map(|c| (c.id.as_str(), c)).collect();

    let reports_generated = deficiencies.iter().filter(|d| has_report(d)).count();
    let with_craftsman: Vec<&Deficiency> = deficiencies
        .iter()
        .filter(|d| {
            d.craftsman_id
                .as_deref()
                .is_some_and(|id| craftsman_map.contains_key(id))
        })
        .collect();
    let reports_sent = with_craftsman.iter().filter(|d| has_report(d)).count();
    let unique_craftsmen: HashSet<&str> = with_craftsman
        .iter()
        .filter_map(|d| d.craftsman_id.as_deref())
        .collect();

    let mut companies = BreakdownCounter::new();
    for deficiency in &with_craftsman {
        let company = deficiency
            .craftsman_id
            .as_deref()
            .and_then(|id| craftsman_map.get(id))
            .and_then(|c| c.company.as_deref())
            .unwrap_or("Unbekannt");
        companies.add_label(company);
    }

    let mut trades = BreakdownCounter::new();
    for craftsman in craftsmen {
        if let Some(trade) = craftsman.trade.as_deref() {
            trades.add_label(trade);
        }
    }

    let mut monthly: HashMap<String, usize> = HashMap::new();
    for deficiency in &with_craftsman {
        if let Some(added) = deficiency.time_added {
            *monthly.entry(month_key(added)).or_default() += 1;
        }
    }

    let mut craftsman_breakdown = companies.into_breakdown(with_craftsman.len());
    craftsman_breakdown.truncate(COMPANY_LIMIT);

    SentimentResponse {
        positive_to_negative: arcs.worsened,
        positive_to_negative_rate: safe_percent(
            arcs.worsened as f64,
            arcs.multi_event_tenants as f64,
            1,
        ),
        negative_to_positive: arcs.improved,
        negative_to_positive_rate: safe_percent(
            arcs.improved as f64,
            arcs.multi_event_tenants as f64,
            1,
        ),
        total_multi_event_tenants: arcs.multi_event_tenants,
        sentiment_transitions: arcs.transitions,
        reports_generated,
        reports_sent,
        unique_craftsmen: unique_craftsmen.len(),
        total_craftsmen: craftsmen.len(),
        craftsman_breakdown,
        trade_breakdown: trades.into_breakdown(craftsmen.len()),
        monthly_mail_volume: counts_to_series(monthly),
    }
}

#[utoipa::path(
    get,
    path = "/api/sentiment",
    params(FilterParams),
    responses(
        (status = 200, description = "Sentiment arcs and mail analytics", body = SentimentResponse),
    )
)]
pub(crate) async fn sentiment_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<SentimentResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (events, deficiencies, craftsmen) = try_join!(
        fetch::events(&data, &filters),
        fetch::deficiencies(&data),
        fetch::craftsmen(&data),
    )
    .map_err(ApiError::fetch)?;
    Ok(Json(build_sentiment(&events, &deficiencies, &craftsmen)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sentiment", get(sentiment_handler))
}
