use memballast_metrics::MetricsService;
use memballast_models::Config;
use memballast_pool::BallastPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: Arc<BallastPool>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Config, pool: Arc<BallastPool>, metrics: Arc<MetricsService>) -> Self {
        Self {
            config,
            pool,
            metrics,
        }
    }
}
