//! API route definitions

use axum::{routing::get, Router};

use super::handlers::{self, SharedState};

/// Routes under `/vector-db`
///
/// `/vector-db/metrics` is left out when `enable_metrics` is false.
pub fn create_vector_db_routes(enable_metrics: bool) -> Router<SharedState> {
    let router = Router::new()
        .route("/vector-db/health", get(handlers::vector_db_health))
        .route("/vector-db/health/detailed", get(handlers::vector_db_health_detailed))
        .route("/vector-db/stats", get(handlers::vector_db_stats));

    if enable_metrics {
        router.route("/vector-db/metrics", get(handlers::vector_db_metrics))
    } else {
        router
    }
}
