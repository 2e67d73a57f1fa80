//! Pure aggregation logic shared by the report endpoints.

pub mod breakdown;
pub mod categories;
pub mod hierarchy;
pub mod metrics;
pub mod sentiment;
pub mod sla;
pub mod timeseries;
