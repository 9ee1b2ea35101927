//! Axum router wiring for the demo server.
//!
//! Application routes first, then the monitor: `Router::layer` only wraps
//! routes that already exist.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/product/:id", get(product))
        .route("/healthz", get(ops::healthz))
        .with_state(state.clone());

    state.monitor().attach(app)
}

async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Json<HashMap<&'static str, String>> {
    state
        .library_metrics()
        .record("memory", "GET", "products", "local");
    Json(HashMap::from([("productId", id)]))
}
