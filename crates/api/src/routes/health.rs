//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    pub backend: BackendHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Whether the hosted backend admin API and email are usable.
#[derive(Debug, Serialize)]
pub struct BackendHealth {
    pub auth_admin_configured: bool,
    pub email_enabled: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

async fn ping_database(state: &AppState) -> Option<u64> {
    match persistence::db::ping(&state.pool).await {
        Ok(latency) => Some(latency.as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            None
        }
    }
}

/// Full health check.
///
/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let latency_ms = ping_database(&state).await;
    let connected = latency_ms.is_some();

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected,
            latency_ms,
        },
        backend: BackendHealth {
            auth_admin_configured: !state.config.backend.url.is_empty()
                && !state.config.backend.service_key.is_empty(),
            email_enabled: state.email.is_enabled(),
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe.
///
/// GET /api/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// Readiness probe: 200 once the database answers.
///
/// GET /api/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match ping_database(&state).await {
        Some(_) => Ok(Json(StatusResponse { status: "ready" })),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "unhealthy",
            version: "0.3.0",
            database: DatabaseHealth {
                connected: false,
                latency_ms: None,
            },
            backend: BackendHealth {
                auth_admin_configured: true,
                email_enabled: false,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["database"]["latency_ms"], serde_json::Value::Null);
        assert_eq!(json["backend"]["auth_admin_configured"], true);
    }

    #[tokio::test]
    async fn test_live() {
        assert_eq!(live().await.0.status, "alive");
    }
}
