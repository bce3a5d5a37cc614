//! Health report assembly.

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::directory::Directory;
use crate::health::memory::{sample_memory, MemoryUsage};
use crate::health::probe::{DatabaseProbe, DatabaseState, DatabaseStatus};
use crate::http::response::{timestamp, MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("memory sampler failed: {0}")]
    Sampler(#[from] tokio::task::JoinError),
}

/// Limits past which the service reports itself degraded.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub max_memory_mb: u64,
    pub max_response: Duration,
}

/// Degraded when the database errored, memory reached its ceiling, or the
/// report itself was slow. Unknown memory does not degrade.
pub fn classify(
    database: DatabaseState,
    memory: Option<MemoryUsage>,
    elapsed: Duration,
    thresholds: Thresholds,
) -> HealthStatus {
    let memory_ok = memory.map_or(true, |m| m.resident_mb < thresholds.max_memory_mb);
    if database != DatabaseState::Error && memory_ok && elapsed < thresholds.max_response {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub response_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySummary {
    pub ip_masking: &'static str,
    pub rate_limiting: &'static str,
    pub cors: &'static str,
    pub security_headers: &'static str,
}

impl SecuritySummary {
    fn from_config(config: &AppConfig) -> Self {
        let state = |on: bool| if on { "active" } else { "disabled" };
        Self {
            ip_masking: "enabled",
            rate_limiting: state(config.rate_limit.enabled),
            cors: "enforced",
            security_headers: state(config.security.enable_headers),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
    pub version: &'static str,
    pub platform: &'static str,
    pub architecture: &'static str,
    pub environment: &'static str,
    pub database: DatabaseStatus,
    pub memory: Option<MemoryUsage>,
    pub performance: PerformanceSummary,
    pub security: SecuritySummary,
    pub charities_verified: usize,
    pub message: String,
}

/// Builds [`HealthReport`]s. Holds no mutable state.
#[derive(Debug)]
pub struct HealthChecker {
    probe: DatabaseProbe,
    thresholds: Thresholds,
    environment: &'static str,
    security: SecuritySummary,
    charities_verified: usize,
    started: Instant,
}

impl HealthChecker {
    pub fn new(config: &AppConfig, directory: &Directory) -> Self {
        Self {
            probe: DatabaseProbe::new(
                config.health.database_address.clone(),
                Duration::from_millis(config.health.database_timeout_ms),
            ),
            thresholds: Thresholds {
                max_memory_mb: config.health.max_memory_mb,
                max_response: Duration::from_millis(config.health.max_response_ms),
            },
            environment: config.environment.as_str(),
            security: SecuritySummary::from_config(config),
            charities_verified: directory.verified_count(),
            started: Instant::now(),
        }
    }

    pub async fn report(&self) -> Result<HealthReport, HealthError> {
        let start = Instant::now();

        let database = self.probe.check().await;
        let memory = tokio::task::spawn_blocking(sample_memory).await?;
        if memory.is_none() {
            tracing::debug!("Process memory unavailable on this platform");
        }

        let elapsed = start.elapsed();
        let status = classify(database.status, memory, elapsed, self.thresholds);

        Ok(HealthReport {
            status,
            timestamp: timestamp(),
            uptime: self.started.elapsed().as_secs_f64(),
            version: env!("CARGO_PKG_VERSION"),
            platform: std::env::consts::OS,
            architecture: std::env::consts::ARCH,
            environment: self.environment,
            database,
            memory,
            performance: PerformanceSummary {
                response_time: format!("{}ms", elapsed.as_millis()),
            },
            security: self.security.clone(),
            charities_verified: self.charities_verified,
            message: format!("{} - Platform serving humanity", MESSAGE),
        })
    }
}
