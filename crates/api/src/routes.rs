use crate::{handlers::*, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Pool inspection
        .route("/", get(pool_status))
        // Pool mutation
        .route("/mem/add", post(add_ballast))
        .route("/mem/set", post(set_ballast))
        .route("/mem/free", post(free_ballast))
        .route("/mem/clear", post(clear_ballast))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
