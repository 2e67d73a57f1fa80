//! Tenant sentiment arcs across repeated conversations.
//!
//! Events are grouped per phone number; only tenants with at least two
//! sentiment-carrying conversations contribute. The arc compares the first
//! and the last sentiment, the transition matrix counts every adjacent pair.

use std::collections::HashMap;

use crate::models::EventRow;

const POSITIVE: [&str; 2] = ["positive", "satisfied"];
const NEGATIVE: [&str; 3] = ["negative", "frustrated", "urgent"];

pub fn is_positive(sentiment: &str) -> bool {
    POSITIVE.contains(&sentiment)
}

pub fn is_negative(sentiment: &str) -> bool {
    NEGATIVE.contains(&sentiment)
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTransition {
    pub from: String,
    pub to: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentArcs {
    /// Tenants with two or more sentiment-carrying conversations.
    pub multi_event_tenants: usize,
    pub improved: usize,
    pub worsened: usize,
    pub transitions: Vec<SentimentTransition>,
}

const TRANSITION_LIMIT: usize = 20;

/// Builds arcs from the filtered event set. Rows without a phone number or
/// without a sentiment never join a group.
pub fn analyze_arcs(events: &[EventRow]) -> SentimentArcs {
    let mut groups: HashMap<&str, Vec<&EventRow>> = HashMap::new();
    for event in events {
        let (Some(phone), Some(_)) = (
            event.phone_number.as_deref(),
            event.tenant_sentiment.as_deref(),
        ) else {
            continue;
        };
        groups.entry(phone).or_default().push(event);
    }

    let mut arcs = SentimentArcs::default();
    let mut matrix: HashMap<(String, String), usize> = HashMap::new();
    for (_, mut timeline) in groups {
        if timeline.len() < 2 {
            continue;
        }
        timeline.sort_by_key(|event| event.started_at);
        arcs.multi_event_tenants += 1;

        // Filters above guarantee the sentiment is present.
        let sentiments: Vec<&str> = timeline
            .iter()
            .filter_map(|event| event.tenant_sentiment.as_deref())
            .collect();
        let first = sentiments[0];
        let last = sentiments[sentiments.len() - 1];
        if is_negative(first) && is_positive(last) {
            arcs.improved += 1;
        } else if is_positive(first) && is_negative(last) {
            arcs.worsened += 1;
        }

        for pair in sentiments.windows(2) {
            *matrix
                .entry((pair[0].to_string(), pair[1].to_string()))
                .or_default() += 1;
        }
    }

    let mut transitions: Vec<SentimentTransition> = matrix
        .into_iter()
        .map(|((from, to), count)| SentimentTransition { from, to, count })
        .collect();
    transitions.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    transitions.truncate(TRANSITION_LIMIT);
    arcs.transitions = transitions;
    arcs
}
