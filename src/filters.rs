use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::parse_timestamp;

/// Query parameters shared by every dashboard endpoint.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// Inclusive lower bound on `started_at`, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound on `started_at`, `YYYY-MM-DD` (widened to end of day).
    pub date_to: Option<String>,
    /// Portfolio brand; `all` or absent means unrestricted.
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilters {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub brand: Option<String>,
}

impl DashboardFilters {
    pub fn from_params(params: &FilterParams) -> Self {
        let brand = params
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
            .map(|value| value.to_string());
        Self {
            date_from: normalize_date(params.date_from.as_deref()),
            date_to: normalize_date(params.date_to.as_deref()),
            brand,
        }
    }

    /// PostgREST predicates against the event view. The upper bound is
    /// widened to the last instant of the day so a bare date stays inclusive.
    pub fn event_predicates(&self) -> Vec<(String, String)> {
        let mut predicates = Vec::new();
        if let Some(from) = &self.date_from {
            predicates.push(("started_at".to_string(), format!("gte.{from}")));
        }
        if let Some(to) = &self.date_to {
            predicates.push((
                "started_at".to_string(),
                format!("lte.{to}T23:59:59.999Z"),
            ));
        }
        if let Some(brand) = &self.brand {
            predicates.push(("brand".to_string(), format!("eq.{brand}")));
        }
        predicates
    }

    /// Parsed date window for in-memory filtering of hierarchy-table rows,
    /// with the upper bound widened exactly like `event_predicates`.
    pub fn date_window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self.date_from.as_deref().and_then(parse_timestamp);
        let to = self.date_to.as_deref().and_then(|value| {
            parse_timestamp(&format!("{value}T23:59:59.999Z")).or_else(|| parse_timestamp(value))
        });
        (from, to)
    }

    /// True when `ts` falls inside the configured date window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let (from, to) = self.date_window();
        if let Some(from) = from {
            if ts < from {
                return false;
            }
        }
        if let Some(to) = to {
            if ts > to {
                return false;
            }
        }
        true
    }

    /// Same filters with the brand restriction removed (cross-brand views).
    pub fn without_brand(&self) -> Self {
        Self {
            brand: None,
            ..self.clone()
        }
    }
}

fn normalize_date(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(from: Option<&str>, to: Option<&str>, brand: Option<&str>) -> FilterParams {
        FilterParams {
            date_from: from.map(String::from),
            date_to: to.map(String::from),
            brand: brand.map(String::from),
        }
    }

    #[test]
    fn brand_all_means_unrestricted() {
        let filters = DashboardFilters::from_params(&params(None, None, Some("all")));
        assert_eq!(filters.brand, None);

        let filters = DashboardFilters::from_params(&params(None, None, Some("ALL")));
        assert_eq!(filters.brand, None);

        let filters = DashboardFilters::from_params(&params(None, None, Some("novac")));
        assert_eq!(filters.brand.as_deref(), Some("novac"));
    }

    #[test]
    fn date_to_is_widened_to_end_of_day() {
        let filters =
            DashboardFilters::from_params(&params(Some("2026-01-01"), Some("2026-01-31"), None));
        let predicates = filters.event_predicates();
        assert_eq!(
            predicates,
            vec![
                ("started_at".to_string(), "gte.2026-01-01".to_string()),
                (
                    "started_at".to_string(),
                    "lte.2026-01-31T23:59:59.999Z".to_string()
                ),
            ]
        );
    }

    #[test]
    fn contains_respects_the_widened_upper_bound() {
        let filters =
            DashboardFilters::from_params(&params(Some("2026-01-01"), Some("2026-01-31"), None));
        let inside = crate::models::parse_timestamp("2026-01-31T22:00:00Z").unwrap();
        let outside = crate::models::parse_timestamp("2026-02-01T00:00:00Z").unwrap();
        let before = crate::models::parse_timestamp("2025-12-31T23:59:59Z").unwrap();
        assert!(filters.contains(inside));
        assert!(!filters.contains(outside));
        assert!(!filters.contains(before));
    }

    #[test]
    fn without_brand_keeps_the_date_window() {
        let filters = DashboardFilters::from_params(&params(
            Some("2026-01-01"),
            Some("2026-01-31"),
            Some("novac"),
        ));
        let unrestricted = filters.without_brand();
        assert_eq!(unrestricted.brand, None);
        assert_eq!(unrestricted.date_from, filters.date_from);
        assert_eq!(unrestricted.date_to, filters.date_to);
    }
}
