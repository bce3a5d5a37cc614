//! Database connectivity probe.
//!
//! The probe only checks that the configured address accepts a TCP
//! connection within the timeout. Nothing is read or written.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseState {
    NotConfigured,
    Healthy,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStatus {
    pub status: DatabaseState,
    /// Connect latency such as `"3ms"`, present when healthy.
    pub latency: Option<String>,
    pub configured: bool,
}

impl DatabaseStatus {
    fn not_configured() -> Self {
        Self {
            status: DatabaseState::NotConfigured,
            latency: None,
            configured: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseProbe {
    address: Option<String>,
    timeout: Duration,
}

impl DatabaseProbe {
    pub fn new(address: Option<String>, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub async fn check(&self) -> DatabaseStatus {
        let Some(address) = &self.address else {
            return DatabaseStatus::not_configured();
        };

        let start = Instant::now();
        let outcome = time::timeout(self.timeout, TcpStream::connect(address.as_str())).await;
        match outcome {
            Ok(Ok(_stream)) => DatabaseStatus {
                status: DatabaseState::Healthy,
                latency: Some(format!("{}ms", start.elapsed().as_millis())),
                configured: true,
            },
            Ok(Err(e)) => {
                tracing::error!(address = %address, error = %e, "Database health check failed");
                Self::failed()
            }
            Err(_) => {
                tracing::error!(
                    address = %address,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Database health check timed out"
                );
                Self::failed()
            }
        }
    }

    fn failed() -> DatabaseStatus {
        DatabaseStatus {
            status: DatabaseState::Error,
            latency: None,
            configured: true,
        }
    }
}
