//! reqmetrics demo server
//!
//! - `GET /product/:id` : instrumented sample route
//! - `GET /healthz`     : liveness (exclude it via `http.exclude_paths`)
//! - `GET <metric_path>`: Prometheus scrape
//!
//! Config path is the first argument (default `reqmetrics.yaml`); built-in
//! defaults apply when the file does not exist.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use reqmetrics_middleware::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reqmetrics-demo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "reqmetrics.yaml".to_string());
    let cfg = if Path::new(&path).exists() {
        config::load_from_file(&path)?
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        config::MetricsConfig::default()
    };

    let listen: SocketAddr = cfg.http.listen.parse()?;
    let metric_path = cfg.http.metric_path.clone();

    let state = app_state::AppState::with_global_registry(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, %metric_path, "reqmetrics-demo starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
