use anyhow::Result;
use memballast_metrics::{MetricsService, TracingService};
use memballast_models::Config;
use memballast_pool::BallastPool;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // An explicit path wins; otherwise try the usual locations.
    let mut config_paths = Vec::new();
    if let Ok(path) = std::env::var("MEMBALLAST_CONFIG") {
        config_paths.push(path);
    }
    config_paths.push("config/default.toml".to_string());
    config_paths.push("configs/default.toml".to_string());

    for path in &config_paths {
        if Path::new(path).exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }
    }

    Err("No config file found".into())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    TracingService::init().map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    info!("Starting memballast server");

    // Load configuration from file or use defaults
    let config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}, using defaults", e);
        Config::default()
    });

    info!("Configuration loaded: {:?}", config);

    let metrics = Arc::new(MetricsService::new()?);
    let pool = Arc::new(BallastPool::new());

    let bind = config.server.bind.clone();
    let port = config.server.port;

    // A bind failure surfaces here and turns into a non-zero exit, which
    // is what the container orchestrator watches for.
    memballast_api::start_server(bind, port, pool, metrics, config)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    info!("memballast server shutdown complete");
    Ok(())
}
