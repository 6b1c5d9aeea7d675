use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;

/// Service-specific readiness check (e.g. database ping).
pub trait ReadinessCheck: Clone + Send + Sync + 'static {
    fn is_ready(&self) -> impl Future<Output = bool> + Send;
}

/// Liveness handler for `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness handler for `GET /readyz`: 200 when the check passes, 503 otherwise.
pub async fn readyz<S: ReadinessCheck>(State(state): State<S>) -> StatusCode {
    if state.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
