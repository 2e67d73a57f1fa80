//! Group-by counting shared by every endpoint that reports distributions.

use std::collections::HashMap;

use crate::analytics::metrics::safe_percent;

pub const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct BreakdownItem {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Insertion-ordered counter. Ties in the final count-descending sort keep
/// first-seen order, so repeated runs over the same data stay stable.
#[derive(Debug, Default)]
pub struct BreakdownCounter {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl BreakdownCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `label`, bucketing missing keys under "unknown".
    pub fn add(&mut self, label: Option<&str>) {
        self.add_label(label.unwrap_or(UNKNOWN_LABEL));
    }

    pub fn add_label(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{label, count, percentage}` entries sorted by count descending,
    /// percentages taken over `total`.
    pub fn into_breakdown(self, total: usize) -> Vec<BreakdownItem> {
        let mut items: Vec<BreakdownItem> = self
            .entries
            .into_iter()
            .map(|(label, count)| BreakdownItem {
                label,
                count,
                percentage: safe_percent(count as f64, total as f64, 1),
            })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count));
        items
    }
}

/// One-shot breakdown over an iterator of optional labels.
pub fn breakdown_of<'a>(
    labels: impl Iterator<Item = Option<&'a str>>,
    total: usize,
) -> Vec<BreakdownItem> {
    let mut counter = BreakdownCounter::new();
    for label in labels {
        counter.add(label);
    }
    counter.into_breakdown(total)
}

/// Truncate a breakdown to its top `n` entries.
pub fn top_n(mut items: Vec<BreakdownItem>, n: usize) -> Vec<BreakdownItem> {
    items.truncate(n);
    items
}
