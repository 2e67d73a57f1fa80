//! Owner and building statistics from the pre-aggregated hierarchy view,
//! plus a severity-by-category matrix from the event view.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::try_join;

use crate::analytics::metrics::{round_to, safe_percent};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilters, FilterParams};
use crate::models::{EventRow, HierarchyStatsRow};
use crate::services::data_source::DataServiceClient;
use crate::services::fetch;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildingStats {
    pub address: String,
    pub total_inquiries: i64,
    pub deficiency_reports: i64,
    pub resolved_count: i64,
    pub tenant_count: i64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStats {
    pub property_owner: String,
    pub brand: Option<String>,
    pub total_inquiries: i64,
    pub deficiency_reports: i64,
    pub resolved_count: i64,
    pub resolution_rate: f64,
    pub tenant_count: i64,
    /// Inquiry-weighted mean; null when no building carries a score.
    pub avg_quality_score: Option<f64>,
    pub avg_duration_min: Option<f64>,
    pub buildings: Vec<BuildingStats>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct SeverityCell {
    pub severity: String,
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesResponse {
    pub owners: Vec<OwnerStats>,
    pub severity_matrix: Vec<SeverityCell>,
}

#[derive(Default)]
struct OwnerAccumulator {
    brand: Option<String>,
    total_inquiries: i64,
    deficiency_reports: i64,
    resolved_count: i64,
    tenant_count: i64,
    quality_sum: f64,
    quality_weight: i64,
    duration_sum: f64,
    duration_weight: i64,
    buildings: Vec<BuildingStats>,
}

pub(crate) fn build_owners(rows: &[HierarchyStatsRow]) -> Vec<OwnerStats> {
    let mut by_owner: HashMap<String, OwnerAccumulator> = HashMap::new();

    for row in rows {
        let owner = row
            .property_owner
            .clone()
            .unwrap_or_else(|| "Unbekannt".to_string());
        let entry = by_owner.entry(owner).or_default();
        if entry.brand.is_none() {
            entry.brand = row.brand.clone();
        }

        entry.total_inquiries += row.total_inquiries;
        entry.deficiency_reports += row.deficiency_reports;
        entry.resolved_count += row.resolved_count;
        entry.tenant_count += row.tenant_count;

        // Per-building averages are weighted by inquiry volume so a quiet
        // building cannot drag the owner mean.
        if let Some(score) = row.avg_quality_score {
            entry.quality_sum += score * row.total_inquiries as f64;
            entry.quality_weight += row.total_inquiries;
        }
        if let Some(duration) = row.avg_duration_min {
            entry.duration_sum += duration * row.total_inquiries as f64;
            entry.duration_weight += row.total_inquiries;
        }

        if let Some(address) = &row.building_address {
            entry.buildings.push(BuildingStats {
                address: address.clone(),
                total_inquiries: row.total_inquiries,
                deficiency_reports: row.deficiency_reports,
                resolved_count: row.resolved_count,
                tenant_count: row.tenant_count,
            });
        }
    }

    let mut owners: Vec<OwnerStats> = by_owner
        .into_iter()
        .map(|(property_owner, mut acc)| {
            acc.buildings.sort_by(|a, b| {
                b.total_inquiries
                    .cmp(&a.total_inquiries)
                    .then_with(|| a.address.cmp(&b.address))
            });
            OwnerStats {
                property_owner,
                brand: acc.brand,
                total_inquiries: acc.total_inquiries,
                deficiency_reports: acc.deficiency_reports,
                resolved_count: acc.resolved_count,
                resolution_rate: safe_percent(
                    acc.resolved_count as f64,
                    acc.deficiency_reports as f64,
                    1,
                ),
                tenant_count: acc.tenant_count,
                avg_quality_score: (acc.quality_weight > 0)
                    .then(|| round_to(acc.quality_sum / acc.quality_weight as f64, 1)),
                avg_duration_min: (acc.duration_weight > 0)
                    .then(|| round_to(acc.duration_sum / acc.duration_weight as f64, 1)),
                buildings: acc.buildings,
            }
        })
        .collect();
    owners.sort_by(|a, b| {
        b.total_inquiries
            .cmp(&a.total_inquiries)
            .then_with(|| a.property_owner.cmp(&b.property_owner))
    });
    owners
}

pub(crate) fn build_severity_matrix(events: &[EventRow]) -> Vec<SeverityCell> {
    let mut cells: HashMap<(String, String), usize> = HashMap::new();
    for row in events {
        if !row.has_deficiency_report {
            continue;
        }
        let severity = row
            .estimated_severity
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let category = row
            .deficiency_category
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *cells.entry((severity, category)).or_default() += 1;
    }
    let mut matrix: Vec<SeverityCell> = cells
        .into_iter()
        .map(|((severity, category), count)| SeverityCell {
            severity,
            category,
            count,
        })
        .collect();
    matrix.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.category.cmp(&b.category))
    });
    matrix
}

#[utoipa::path(
    get,
    path = "/api/properties",
    params(FilterParams),
    responses(
        (status = 200, description = "Owner and building statistics", body = PropertiesResponse),
    )
)]
pub(crate) async fn properties_handler(
    State(data): State<Arc<DataServiceClient>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<PropertiesResponse>> {
    let filters = DashboardFilters::from_params(&params);
    let (stats, events) = try_join!(
        fetch::hierarchy_stats(&data, &filters),
        fetch::events(&data, &filters),
    )
    .map_err(ApiError::fetch)?;
    Ok(Json(PropertiesResponse {
        owners: build_owners(&stats),
        severity_matrix: build_severity_matrix(&events),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/properties", get(properties_handler))
}
