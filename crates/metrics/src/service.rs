use memballast_models::BallastError;
use prometheus::{Counter, Encoder, IntGauge, Registry, TextEncoder};
use tracing::{info, instrument};

pub struct MetricsService {
    registry: Registry,
    allocated_mbytes: IntGauge,
    pool_groups: IntGauge,
    reservations_total: Counter,
    releases_total: Counter,
    rejected_requests_total: Counter,
}

impl MetricsService {
    pub fn new() -> Result<Self, BallastError> {
        let registry = Registry::new();

        let allocated_mbytes = IntGauge::new(
            "ballast_allocated_mbytes",
            "Resident memory currently held by the ballast pool in MiB",
        )
        .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        let pool_groups = IntGauge::new(
            "ballast_pool_groups",
            "Number of reservation groups in the ballast pool",
        )
        .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        let reservations_total = Counter::new(
            "ballast_reservations_total",
            "Total number of accepted grow and resize requests",
        )
        .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        let releases_total = Counter::new(
            "ballast_releases_total",
            "Total number of release and clear requests",
        )
        .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        let rejected_requests_total = Counter::new(
            "ballast_rejected_requests_total",
            "Total number of requests rejected by validation",
        )
        .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        // Register metrics
        registry
            .register(Box::new(allocated_mbytes.clone()))
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(pool_groups.clone()))
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(reservations_total.clone()))
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(releases_total.clone()))
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(rejected_requests_total.clone()))
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        Ok(Self {
            registry,
            allocated_mbytes,
            pool_groups,
            reservations_total,
            releases_total,
            rejected_requests_total,
        })
    }

    #[instrument(skip(self))]
    pub async fn record_reservation(&self, mb: u64) {
        self.reservations_total.inc();
        info!("Recorded reservation of {} MB", mb);
    }

    #[instrument(skip(self))]
    pub async fn record_release(&self, mb: u64) {
        self.releases_total.inc();
        info!("Recorded release of {} MB", mb);
    }

    #[instrument(skip(self))]
    pub async fn record_rejection(&self, error_type: &str) {
        self.rejected_requests_total.inc();
        info!("Recorded rejected request - type: {}", error_type);
    }

    /// Mirrors the latest pool snapshot into the gauges.
    pub fn set_pool(&self, allocated_mb: u64, groups: usize) {
        self.allocated_mbytes.set(allocated_mb as i64);
        self.pool_groups.set(groups as i64);
    }

    #[instrument(skip(self))]
    pub async fn get_prometheus_metrics(&self) -> Result<String, BallastError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| BallastError::InternalError { reason: e.to_string() })?;

        String::from_utf8(buffer).map_err(|e| BallastError::InternalError { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gauges_follow_the_pool_snapshot() {
        let metrics = MetricsService::new().unwrap();

        metrics.set_pool(128, 2);
        metrics.record_reservation(128).await;

        let text = metrics.get_prometheus_metrics().await.unwrap();
        assert!(text.contains("ballast_allocated_mbytes 128"));
        assert!(text.contains("ballast_pool_groups 2"));
        assert!(text.contains("ballast_reservations_total 1"));
    }

    #[tokio::test]
    async fn exposition_lists_every_metric() {
        let metrics = MetricsService::new().unwrap();
        let text = metrics.get_prometheus_metrics().await.unwrap();

        for name in [
            "ballast_allocated_mbytes",
            "ballast_pool_groups",
            "ballast_reservations_total",
            "ballast_releases_total",
            "ballast_rejected_requests_total",
        ] {
            assert!(text.contains(name), "missing metric {name}");
        }
    }
}
