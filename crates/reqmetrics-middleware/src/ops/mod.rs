//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - scrape     : registry exposition in Prometheus text format

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use reqmetrics_core::encoder::TEXT_CONTENT_TYPE;
use reqmetrics_core::Registry;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Gather `registry` and serve it. A failed gather is a 500 with no partial body.
pub fn scrape(registry: &Registry) -> Response {
    match registry.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind().as_str(), "metrics gather failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics gather failed").into_response()
        }
    }
}
