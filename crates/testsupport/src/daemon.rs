use anyhow::Result;
use memballast_models::Config;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::time::sleep;

#[derive(Debug)]
pub struct TestDaemon {
    pub base_url: String,
    pub config_dir: TempDir,
    process: Child,
}

impl TestDaemon {
    pub async fn kill(&mut self) -> Result<()> {
        self.process.kill().await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverride {
    pub port: Option<u16>,
    pub chunk_mb: Option<u64>,
    pub max_add_mb: Option<u64>,
}

pub async fn spawn_daemon(config_override: Option<ConfigOverride>) -> Result<TestDaemon> {
    // Write a config file for this daemon into its own temp directory
    let config_dir = tempfile::tempdir()?;

    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    if let Some(override_config) = config_override {
        if let Some(port) = override_config.port {
            config.server.port = port;
        }
        if let Some(chunk_mb) = override_config.chunk_mb {
            config.ballast.chunk_mb = chunk_mb;
        }
        if let Some(max_add_mb) = override_config.max_add_mb {
            config.ballast.max_add_mb = max_add_mb;
        }
    }

    let config_path = config_dir.path().join("config.toml");
    std::fs::write(&config_path, toml::to_string(&config)?)?;

    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--bin", "memballast-server"]);
    cmd.env("MEMBALLAST_CONFIG", &config_path);
    cmd.current_dir(std::env::current_dir()?);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut process = cmd.spawn()?;

    let base_url = format!("http://{}:{}", config.server.bind, config.server.port);

    // Wait for the daemon to answer its health probe
    let client = reqwest::Client::new();
    for _ in 0..60 {
        if let Ok(response) = client.get(format!("{base_url}/health")).send().await {
            if response.status().is_success() {
                return Ok(TestDaemon {
                    base_url,
                    config_dir,
                    process,
                });
            }
        }
        sleep(Duration::from_millis(500)).await;
    }

    process.kill().await.ok();
    anyhow::bail!("daemon did not become healthy at {base_url}")
}
