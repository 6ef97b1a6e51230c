pub mod handlers;
pub mod routes;
pub mod state;

pub use handlers::*;
pub use routes::*;
pub use state::*;

use memballast_metrics::MetricsService;
use memballast_models::Config;
use memballast_pool::BallastPool;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Binds the listening socket and serves the ballast API until a shutdown
/// signal arrives. A failed bind propagates to the caller so the process
/// can exit non-zero.
pub async fn start_server(
    bind: String,
    port: u16,
    pool: Arc<BallastPool>,
    metrics: Arc<MetricsService>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app_state = AppState::new(config, pool, metrics);

    let app = build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!("Ballast API server listening on {}:{}", bind, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
    }
}
