//! Validated record types for the remote tables and views.
//!
//! Each type is built from a raw `serde_json::Value` row right after fetch;
//! everything downstream works on these closed schemas.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::json::{bool_field, f64_field, i64_field, id_field, str_field};

/// One tenant inquiry event from the `v_dashboard_base` view.
#[derive(Debug, Clone, Default)]
pub struct EventRow {
    pub conversation_id: Option<String>,
    pub phone_number: Option<String>,
    pub brand: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub message_count: Option<i64>,
    pub inbound_count: Option<i64>,
    pub ai_count: Option<i64>,
    pub ping_pong_count: Option<i64>,
    pub first_response_sec: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub time_to_report_sec: Option<f64>,
    pub automation_rate: Option<f64>,
    pub ai_quality_score: Option<f64>,
    pub ai_unnecessary_questions: Option<f64>,
    pub ai_loop_detected: bool,
    pub ai_misunderstood: bool,
    pub ai_correct_triage: bool,
    pub tenant_sentiment: Option<String>,
    pub tenant_effort_score: Option<f64>,
    pub resolution_method: Option<String>,
    pub event_outcome: Option<String>,
    pub is_bug: bool,
    pub bug_category: Option<String>,
    pub bug_reproducible: Option<String>,
    pub bug_reviewed_at: Option<String>,
    pub review_status: Option<String>,
    pub bug_false_success: bool,
    pub bug_failed_report: bool,
    pub is_urgent: bool,
    pub has_deficiency_report: bool,
    pub has_craftsman: bool,
    pub has_agent_takeover: bool,
    pub deficiency_category: Option<String>,
    pub deficiency_state_label: Option<String>,
    pub deficiency_state_category: Option<String>,
    pub deficiency_total_cost: Option<f64>,
    pub estimated_severity: Option<String>,
    pub sla_compliance: Option<String>,
    pub language: Option<String>,
    pub intent: Option<String>,
    pub inquiry_type: Option<String>,
    pub topic_label: Option<String>,
    pub is_inside_hours: Option<bool>,
    pub started_dow: Option<i64>,
    pub started_hour_cet: Option<i64>,
}

impl EventRow {
    pub fn from_value(row: &JsonValue) -> Self {
        Self {
            conversation_id: id_field(row, "conversation_id"),
            phone_number: str_field(row, "phone_number"),
            brand: str_field(row, "brand"),
            started_at: str_field(row, "started_at")
                .as_deref()
                .and_then(parse_timestamp),
            message_count: i64_field(row, "message_count"),
            inbound_count: i64_field(row, "inbound_count"),
            ai_count: i64_field(row, "ai_count"),
            ping_pong_count: i64_field(row, "ping_pong_count"),
            first_response_sec: f64_field(row, "first_response_sec"),
            duration_minutes: f64_field(row, "duration_minutes"),
            time_to_report_sec: f64_field(row, "time_to_report_sec"),
            automation_rate: f64_field(row, "automation_rate"),
            ai_quality_score: f64_field(row, "ai_quality_score"),
            ai_unnecessary_questions: f64_field(row, "ai_unnecessary_questions"),
            ai_loop_detected: bool_field(row, "ai_loop_detected"),
            ai_misunderstood: bool_field(row, "ai_misunderstood"),
            ai_correct_triage: bool_field(row, "ai_correct_triage"),
            tenant_sentiment: str_field(row, "tenant_sentiment"),
            tenant_effort_score: f64_field(row, "tenant_effort_score"),
            resolution_method: str_field(row, "resolution_method"),
            event_outcome: str_field(row, "event_outcome"),
            is_bug: bool_field(row, "is_bug"),
            bug_category: str_field(row, "bug_category"),
            bug_reproducible: str_field(row, "reproducible"),
            bug_reviewed_at: str_field(row, "bug_reviewed_at"),
            review_status: str_field(row, "review_status"),
            bug_false_success: bool_field(row, "bug_false_success"),
            bug_failed_report: bool_field(row, "bug_failed_report"),
            is_urgent: bool_field(row, "is_urgent"),
            has_deficiency_report: bool_field(row, "has_deficiency_report"),
            has_craftsman: bool_field(row, "has_craftsman"),
            has_agent_takeover: bool_field(row, "has_agent_takeover"),
            deficiency_category: str_field(row, "deficiency_category"),
            deficiency_state_label: str_field(row, "deficiency_state_label"),
            deficiency_state_category: str_field(row, "deficiency_state_category"),
            deficiency_total_cost: f64_field(row, "deficiency_total_cost"),
            estimated_severity: str_field(row, "estimated_severity"),
            sla_compliance: str_field(row, "sla_compliance"),
            language: str_field(row, "language"),
            intent: str_field(row, "intent"),
            inquiry_type: str_field(row, "inquiry_type"),
            topic_label: str_field(row, "topic_label"),
            is_inside_hours: row.get("is_inside_hours").and_then(|v| v.as_bool()),
            started_dow: i64_field(row, "started_dow"),
            started_hour_cet: i64_field(row, "started_hour_cet"),
        }
    }
}

/// Top-level portfolio unit from `azure_accommodations`.
#[derive(Debug, Clone)]
pub struct Accommodation {
    pub id: String,
    pub name: Option<String>,
    pub brand: Option<String>,
}

impl Accommodation {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            id: id_field(row, "id")?,
            name: str_field(row, "name"),
            brand: str_field(row, "brand"),
        })
    }

    /// Brand-or-name fallback used for portfolio attribution.
    pub fn brand_label(&self) -> Option<&str> {
        self.brand.as_deref().or(self.name.as_deref())
    }
}

/// Building from `azure_real_estate_condominia`.
#[derive(Debug, Clone)]
pub struct Condominium {
    pub id: String,
    pub accommodation_id: Option<String>,
    pub address: Option<String>,
    pub property_owner: Option<String>,
}

impl Condominium {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            id: id_field(row, "id")?,
            accommodation_id: id_field(row, "accommodation_id"),
            address: str_field(row, "address"),
            property_owner: str_field(row, "property_owner"),
        })
    }
}

/// Rental unit from `azure_real_estate_properties`.
#[derive(Debug, Clone)]
pub struct Property {
    pub id: String,
    pub condominium_id: Option<String>,
    pub apartment_number: Option<String>,
}

impl Property {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            id: id_field(row, "id")?,
            condominium_id: id_field(row, "real_estate_condominium_id"),
            apartment_number: str_field(row, "apartment_number"),
        })
    }
}

/// Maintenance ticket from `azure_real_estate_deficiencies`.
#[derive(Debug, Clone)]
pub struct Deficiency {
    pub id: String,
    pub property_id: Option<String>,
    pub type_bits: u32,
    pub state: i64,
    pub time_added: Option<DateTime<Utc>>,
    pub next_follow_up: Option<DateTime<Utc>>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub total_cost: Option<f64>,
    pub craftsman_id: Option<String>,
    pub report_body: Option<String>,
}

impl Deficiency {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            id: id_field(row, "id")?,
            property_id: id_field(row, "real_estate_property_id"),
            type_bits: i64_field(row, "deficiency_types").unwrap_or(0).max(0) as u32,
            state: i64_field(row, "deficiency_state").unwrap_or(-1),
            time_added: str_field(row, "time_added")
                .as_deref()
                .and_then(parse_timestamp),
            next_follow_up: str_field(row, "next_follow_up")
                .as_deref()
                .and_then(parse_timestamp),
            tenant_name: str_field(row, "tenant_name"),
            tenant_phone: str_field(row, "tenant_phone_number"),
            total_cost: f64_field(row, "total_cost"),
            craftsman_id: id_field(row, "craftsman_id"),
            report_body: str_field(row, "deficiency_report"),
        })
    }

    /// Follow-up timestamps at the zero-date sentinel (year <= 2000) are not
    /// real dates and must stay out of duration and SLA arithmetic.
    pub fn valid_follow_up(&self) -> Option<DateTime<Utc>> {
        use chrono::Datelike;
        self.next_follow_up.filter(|ts| ts.year() > 2000)
    }
}

/// Row from `azure_real_estate_craftsmen`.
#[derive(Debug, Clone)]
pub struct Craftsman {
    pub id: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub trade: Option<String>,
}

impl Craftsman {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            id: id_field(row, "id")?,
            email: str_field(row, "email"),
            company: str_field(row, "company"),
            trade: str_field(row, "trade"),
        })
    }
}

/// SLA threshold codes from `azure_real_estate_company_configurations`.
#[derive(Debug, Clone)]
pub struct CompanyConfig {
    pub accommodation_id: String,
    pub cosmetic_issue_response_time: Option<String>,
    pub partial_limitation_response_time: Option<String>,
    pub severe_deficiency_response_time: Option<String>,
}

impl CompanyConfig {
    pub fn from_value(row: &JsonValue) -> Option<Self> {
        Some(Self {
            accommodation_id: id_field(row, "accommodation_id")?,
            cosmetic_issue_response_time: str_field(row, "cosmetic_issue_response_time"),
            partial_limitation_response_time: str_field(row, "partial_limitation_response_time"),
            severe_deficiency_response_time: str_field(row, "severe_deficiency_response_time"),
        })
    }
}

/// Pre-aggregated owner/building stats from the `v_property_hierarchy` view.
#[derive(Debug, Clone)]
pub struct HierarchyStatsRow {
    pub brand: Option<String>,
    pub property_owner: Option<String>,
    pub building_address: Option<String>,
    pub total_inquiries: i64,
    pub deficiency_reports: i64,
    pub resolved_count: i64,
    pub tenant_count: i64,
    pub avg_quality_score: Option<f64>,
    pub avg_duration_min: Option<f64>,
}

impl HierarchyStatsRow {
    pub fn from_value(row: &JsonValue) -> Self {
        Self {
            brand: str_field(row, "brand"),
            property_owner: str_field(row, "property_owner"),
            building_address: str_field(row, "building_address"),
            total_inquiries: i64_field(row, "total_inquiries").unwrap_or(0),
            deficiency_reports: i64_field(row, "deficiency_reports").unwrap_or(0),
            resolved_count: i64_field(row, "resolved_count").unwrap_or(0),
            tenant_count: i64_field(row, "tenant_count").unwrap_or(0),
            avg_quality_score: f64_field(row, "avg_quality_score"),
            avg_duration_min: f64_field(row, "avg_duration_min"),
        }
    }
}

/// Reviewer correction from `ai_analysis_corrections`.
#[derive(Debug, Clone)]
pub struct CorrectionRow {
    pub field_corrected: Option<String>,
    pub status: Option<String>,
}

impl CorrectionRow {
    pub fn from_value(row: &JsonValue) -> Self {
        Self {
            field_corrected: str_field(row, "field_corrected"),
            status: str_field(row, "status"),
        }
    }
}

/// Cost parameters from the pricing table, with documented defaults.
#[derive(Debug, Clone)]
pub struct PricingParams {
    pub manual_cost_per_inquiry: f64,
    pub assistant_cost_per_inquiry: f64,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            manual_cost_per_inquiry: 15.0,
            assistant_cost_per_inquiry: 2.0,
        }
    }
}

impl PricingParams {
    pub fn from_value(row: &JsonValue) -> Self {
        let defaults = Self::default();
        Self {
            manual_cost_per_inquiry: f64_field(row, "manual_cost_per_inquiry")
                .unwrap_or(defaults.manual_cost_per_inquiry),
            assistant_cost_per_inquiry: f64_field(row, "ailean_cost_per_inquiry")
                .unwrap_or(defaults.assistant_cost_per_inquiry),
        }
    }
}

/// Lenient timestamp parsing. The event view emits RFC 3339; the azure
/// tables sometimes ship naive timestamps or bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_naive_and_date_only() {
        assert!(parse_timestamp("2026-03-04T12:30:00Z").is_some());
        assert!(parse_timestamp("2026-03-04T12:30:00+02:00").is_some());
        assert!(parse_timestamp("2026-03-04T12:30:00").is_some());
        assert!(parse_timestamp("2026-03-04").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn sentinel_follow_up_is_rejected() {
        let row = json!({
            "id": 1,
            "real_estate_property_id": 2,
            "deficiency_types": 8192,
            "deficiency_state": 9,
            "time_added": "2026-01-10T08:00:00Z",
            "next_follow_up": "0001-01-01T00:00:00Z",
        });
        let deficiency = Deficiency::from_value(&row).unwrap();
        assert!(deficiency.next_follow_up.is_some());
        assert!(deficiency.valid_follow_up().is_none());
    }

    #[test]
    fn event_row_tolerates_missing_and_string_typed_fields() {
        let row = json!({
            "phone_number": "+41790000001",
            "ai_quality_score": "7.5",
            "ai_loop_detected": true,
            "started_at": "2026-02-01T09:15:00Z",
        });
        let event = EventRow::from_value(&row);
        assert_eq!(event.phone_number.as_deref(), Some("+41790000001"));
        assert_eq!(event.ai_quality_score, Some(7.5));
        assert!(event.ai_loop_detected);
        assert!(!event.is_bug);
        assert_eq!(event.started_at.unwrap().year(), 2026);
        assert_eq!(event.is_inside_hours, None);
    }

    #[test]
    fn accommodation_brand_falls_back_to_name() {
        let row = json!({ "id": "a1", "name": "Novac Portfolio", "brand": null });
        let acc = Accommodation::from_value(&row).unwrap();
        assert_eq!(acc.brand_label(), Some("Novac Portfolio"));
    }
}
