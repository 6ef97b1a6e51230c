use anyhow::Result;
use memballast_models::{
    AddBallastResponse, ClearBallastResponse, FreeBallastResponse, PoolStatus, SetBallastResponse,
};
use reqwest::{Client, Response};

pub struct BallastClient {
    client: Client,
    base_url: String,
}

impl BallastClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn status(&self) -> Result<PoolStatus> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Status failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn add(&self, mb: Option<u64>, chunk: Option<u64>) -> Result<AddBallastResponse> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(mb) = mb {
            query.push(("mb", mb.to_string()));
        }
        if let Some(chunk) = chunk {
            query.push(("chunk", chunk.to_string()));
        }

        let response = self
            .client
            .post(format!("{}/mem/add", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Add ballast failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn set(&self, mb: u64) -> Result<SetBallastResponse> {
        let response = self
            .client
            .post(format!("{}/mem/set", self.base_url))
            .query(&[("mb", mb.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Set ballast failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn free(&self, mb: u64) -> Result<FreeBallastResponse> {
        let response = self
            .client
            .post(format!("{}/mem/free", self.base_url))
            .query(&[("mb", mb.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Free ballast failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn clear(&self) -> Result<ClearBallastResponse> {
        let response = self
            .client
            .post(format!("{}/mem/clear", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Clear ballast failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed with {}", response.status());
        }

        Ok(response.text().await?)
    }

    pub async fn metrics_text(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Metrics failed with {}", response.status());
        }

        Ok(response.text().await?)
    }

    /// Raw POST for asserting on rejected requests.
    pub async fn post_raw(&self, path_and_query: &str) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url, path_and_query))
            .send()
            .await?)
    }
}

// Convenience functions for tests
pub async fn status(daemon: &TestDaemon) -> Result<PoolStatus> {
    BallastClient::new(daemon.base_url.clone()).status().await
}

pub async fn add(daemon: &TestDaemon, mb: Option<u64>, chunk: Option<u64>) -> Result<AddBallastResponse> {
    BallastClient::new(daemon.base_url.clone()).add(mb, chunk).await
}

pub async fn set(daemon: &TestDaemon, mb: u64) -> Result<SetBallastResponse> {
    BallastClient::new(daemon.base_url.clone()).set(mb).await
}

pub async fn free(daemon: &TestDaemon, mb: u64) -> Result<FreeBallastResponse> {
    BallastClient::new(daemon.base_url.clone()).free(mb).await
}

pub async fn clear(daemon: &TestDaemon) -> Result<ClearBallastResponse> {
    BallastClient::new(daemon.base_url.clone()).clear().await
}

use crate::daemon::TestDaemon;
