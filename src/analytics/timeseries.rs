//! Calendar bucketing for trend series.
//!
//! All bucket keys sort lexicographically in chronological order, so series
//! are emitted by sorting the key space directly.

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;

use crate::analytics::metrics::{safe_avg, safe_percent};
use crate::models::EventRow;

/// ISO-8601 week key, `YYYY-Www` (Thursday-anchored week numbering).
pub fn iso_week_key(ts: DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Calendar month key, `YYYY-MM`.
pub fn month_key(ts: DateTime<Utc>) -> String {
    format!("{}-{:02}", ts.year(), ts.month())
}

/// Calendar quarter key, `YYYY-Qn`.
pub fn quarter_key(ts: DateTime<Utc>) -> String {
    format!("{}-Q{}", ts.year(), (ts.month0() / 3) + 1)
}

/// Calendar year key, `YYYY`.
pub fn year_key(ts: DateTime<Utc>) -> String {
    ts.year().to_string()
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct PeriodCount {
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct TimeSeriesPoint {
    pub period: String,
    pub value: f64,
}

/// Sorted `{period, count}` series from a key-count map.
pub fn counts_to_series(map: HashMap<String, usize>) -> Vec<PeriodCount> {
    let mut series: Vec<PeriodCount> = map
        .into_iter()
        .map(|(period, count)| PeriodCount { period, count })
        .collect();
    series.sort_by(|a, b| a.period.cmp(&b.period));
    series
}

/// Per-week accumulator for the trend endpoints.
#[derive(Debug, Clone, Default)]
pub struct WeekBucket {
    pub count: usize,
    pub quality_sum: f64,
    pub quality_count: usize,
    pub loop_count: usize,
    pub bug_count: usize,
    pub automation_sum: f64,
    pub automation_count: usize,
    pub deficiency_report_count: usize,
}

impl WeekBucket {
    pub fn observe(&mut self, event: &EventRow) {
        self.count += 1;
        if let Some(score) = event.ai_quality_score {
            self.quality_sum += score;
            self.quality_count += 1;
        }
        if event.ai_loop_detected {
            self.loop_count += 1;
        }
        if event.is_bug {
            self.bug_count += 1;
        }
        if let Some(rate) = event.automation_rate {
            self.automation_sum += rate;
            self.automation_count += 1;
        }
        if event.has_deficiency_report {
            self.deficiency_report_count += 1;
        }
    }

    pub fn avg_quality(&self) -> f64 {
        safe_avg(self.quality_sum, self.quality_count as f64, 2)
    }

    pub fn loop_rate(&self) -> f64 {
        safe_percent(self.loop_count as f64, self.count as f64, 1)
    }

    pub fn bug_rate(&self) -> f64 {
        safe_percent(self.bug_count as f64, self.count as f64, 1)
    }

    pub fn automation_rate(&self) -> f64 {
        safe_avg(self.automation_sum, self.automation_count as f64, 1)
    }

    pub fn deficiency_report_rate(&self) -> f64 {
        safe_percent(self.deficiency_report_count as f64, self.count as f64, 1)
    }
}

/// Events grouped into ISO-week buckets, sorted by week key. Events without
/// a start timestamp are skipped.
pub fn weekly_buckets(events: &[EventRow]) -> Vec<(String, WeekBucket)> {
    let mut map: HashMap<String, WeekBucket> = HashMap::new();
    for event in events {
        let Some(started) = event.started_at else {
            continue;
        };
        map.entry(iso_week_key(started)).or_default().observe(event);
    }
    let mut buckets: Vec<(String, WeekBucket)> = map.into_iter().collect();
    buckets.sort_by(|a, b| a.0.cmp(&b.0));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;

    #[test]
    fn iso_week_is_thursday_anchored() {
        // 2026-01-01 is a Thursday, so it lands in week 1 of 2026.
        let ts = parse_timestamp("2026-01-01T10:00:00Z").unwrap();
        assert_eq!(iso_week_key(ts), "2026-W01");
        // 2027-01-01 is a Friday in the week of Thursday 2026-12-31.
        let ts = parse_timestamp("2027-01-01T10:00:00Z").unwrap();
        assert_eq!(iso_week_key(ts), "2026-W53");
    }

    #[test]
    fn calendar_keys_are_zero_padded_and_sortable() {
        let ts = parse_timestamp("2026-03-04T00:00:00Z").unwrap();
        assert_eq!(month_key(ts), "2026-03");
        assert_eq!(quarter_key(ts), "2026-Q1");
        assert_eq!(year_key(ts), "2026");

        let november = parse_timestamp("2026-11-15T00:00:00Z").unwrap();
        assert_eq!(quarter_key(november), "2026-Q4");
        assert!(month_key(ts) < month_key(november));
    }

    #[test]
    fn weekly_buckets_accumulate_and_sort() {
        let mut first = EventRow::from_value(&serde_json::json!({
            "started_at": "2026-01-05T10:00:00Z",
            "ai_quality_score": 8.0,
            "ai_loop_detected": true,
        }));
        first.is_bug = false;
        let second = EventRow::from_value(&serde_json::json!({
            "started_at": "2026-01-06T10:00:00Z",
            "ai_quality_score": 6.0,
        }));
        let earlier_week = EventRow::from_value(&serde_json::json!({
            "started_at": "2026-01-01T10:00:00Z",
        }));
        let no_timestamp = EventRow::default();

        let buckets = weekly_buckets(&[first, second, earlier_week, no_timestamp]);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0, "2026-W01");
        assert_eq!(buckets[1].0, "2026-W02");
        let week2 = &buckets[1].1;
        assert_eq!(week2.count, 2);
        assert_eq!(week2.avg_quality(), 7.0);
        assert_eq!(week2.loop_rate(), 50.0);
    }

    #[test]
    fn counts_series_sorts_by_period() {
        let mut map = HashMap::new();
        map.insert("2026-02".to_string(), 2);
        map.insert("2026-01".to_string(), 5);
        let series = counts_to_series(map);
        assert_eq!(series[0].period, "2026-01");
        assert_eq!(series[1].period, "2026-02");
    }
}
