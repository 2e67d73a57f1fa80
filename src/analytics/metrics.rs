//! Numeric building blocks shared by every endpoint.

/// Percentage with a fixed number of decimals; a zero denominator yields 0.
pub fn safe_percent(numerator: f64, denominator: f64, decimals: u32) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round_to(numerator / denominator * 100.0, decimals)
}

/// Average with a fixed number of decimals; a zero count yields 0.
pub fn safe_avg(sum: f64, count: f64, decimals: u32) -> f64 {
    if count == 0.0 {
        return 0.0;
    }
    round_to(sum / count, decimals)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Upper median: the element at `floor(n/2)` of the ascending sort. Biased
/// for even-length inputs, kept for parity with existing dashboards.
pub fn upper_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

/// Mean over the `Some` values only, 0 when none are present.
pub fn avg_of(values: impl Iterator<Item = Option<f64>>, decimals: u32) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values.flatten() {
        sum += value;
        count += 1;
    }
    safe_avg(sum, count as f64, decimals)
}

const EFFORT_WEIGHT_INBOUND: f64 = 0.30;
const EFFORT_WEIGHT_TIME: f64 = 0.20;
const EFFORT_WEIGHT_FRICTION: f64 = 0.25;
const EFFORT_WEIGHT_RESOLUTION: f64 = 0.25;

/// Composite tenant-effort score: four 1/3/5/7/9 tier functions combined
/// with fixed weights (0.30 contact volume, 0.20 elapsed time, 0.25
/// friction, 0.25 resolution outcome). Duration is capped at 60 minutes
/// before scoring.
pub fn effort_score(
    inbound_count: i64,
    duration_minutes: f64,
    ping_pong_count: i64,
    outcome: Option<&str>,
) -> f64 {
    let inbound = score_inbound(inbound_count);
    let time = score_time(duration_minutes.min(60.0));
    let friction = score_friction(ping_pong_count);
    let resolution = score_resolution(outcome);
    EFFORT_WEIGHT_INBOUND * inbound
        + EFFORT_WEIGHT_TIME * time
        + EFFORT_WEIGHT_FRICTION * friction
        + EFFORT_WEIGHT_RESOLUTION * resolution
}

fn score_inbound(count: i64) -> f64 {
    match count {
        ..=3 => 1.0,
        4..=6 => 3.0,
        7..=10 => 5.0,
        11..=15 => 7.0,
        _ => 9.0,
    }
}

fn score_time(minutes: f64) -> f64 {
    if minutes <= 5.0 {
        1.0
    } else if minutes <= 15.0 {
        3.0
    } else if minutes <= 30.0 {
        5.0
    } else if minutes <= 60.0 {
        7.0
    } else {
        9.0
    }
}

fn score_friction(ping_pong: i64) -> f64 {
    match ping_pong {
        ..=2 => 1.0,
        3..=5 => 3.0,
        6..=8 => 5.0,
        9..=12 => 7.0,
        _ => 9.0,
    }
}

fn score_resolution(outcome: Option<&str>) -> f64 {
    match outcome {
        Some("resolved") => 1.0,
        Some("no_response") => 5.0,
        Some("unresolved") => 7.0,
        _ => 9.0,
    }
}
