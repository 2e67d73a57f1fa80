pub mod ai_perf;
pub mod ai_quality;
pub mod benchmark;
pub mod bugs;
pub mod craftsmen;
pub mod deficiencies;
pub mod escalations;
pub mod health;
pub mod insights;
pub mod properties;
pub mod reports;
pub mod review;
pub mod roi;
pub mod sentiment;
pub mod summary;
pub mod trends;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(summary::router())
                .merge(trends::router())
                .merge(ai_quality::router())
                .merge(ai_perf::router())
                .merge(deficiencies::router())
                .merge(bugs::router())
                .merge(review::router())
                .merge(escalations::router())
                .merge(craftsmen::router())
                .merge(properties::router())
                .merge(reports::router())
                .merge(sentiment::router())
                .merge(benchmark::router())
                .merge(insights::router())
                .merge(roi::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
