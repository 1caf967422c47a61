use axum::{Json, Router, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Router exposing `/health` and `/ready`.
///
/// Liveness is unconditional; readiness is too for a single-store service —
/// a failing database surfaces through request errors, not readiness flaps.
pub fn health_router(service: &'static str, version: &'static str) -> Router {
    let handler = move || async move {
        Json(HealthResponse {
            status: "ok",
            service,
            version,
        })
    };

    Router::new()
        .route("/health", get(handler))
        .route("/ready", get(handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_shape() {
        let body = serde_json::to_value(HealthResponse {
            status: "ok",
            service: "store-api",
            version: "0.1.0",
        })
        .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "store-api");
    }
}
