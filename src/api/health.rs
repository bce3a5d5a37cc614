use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::health::{HealthReport, HealthStatus};
use crate::http::request::{user_agent, ClientAddr};
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn health_check(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<HealthReport>), ApiError> {
    let report = state.health.report().await.map_err(|e| {
        tracing::error!(client = %client, error = %e, "Health check failed");
        ApiError::HealthCheckFailed(e.to_string())
    })?;

    tracing::info!(
        client = %client,
        status = ?report.status,
        response_time = %report.performance.response_time,
        database = ?report.database.status,
        resident_mb = report.memory.map(|m| m.resident_mb),
        user_agent = %user_agent(&headers),
        "Health check"
    );

    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    Ok((status, Json(report)))
}
