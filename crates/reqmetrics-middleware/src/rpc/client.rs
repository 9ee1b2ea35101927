use std::future::Future;

use tokio::time::Instant;

use crate::obs::{RequestMetrics, TYPE_GRPC};

/// Client-side unary interceptor.
///
/// Records `client_handle_total` and `client_handle_seconds` with
/// `{method, type="grpc", server=target}` for every call, successful or not.
#[derive(Clone)]
pub struct ClientInterceptor {
    metrics: RequestMetrics,
}

impl ClientInterceptor {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self { metrics }
    }

    /// Interceptor over `RequestMetrics::global()`.
    pub fn global() -> Self {
        Self::new(RequestMetrics::global().clone())
    }

    pub async fn intercept<F, T, E>(&self, method: &str, target: &str, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let res = call.await;
        self.metrics
            .record_client(method, TYPE_GRPC, target, start.elapsed());
        res
    }
}
