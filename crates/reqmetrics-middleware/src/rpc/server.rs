use std::future::Future;

use tokio::time::Instant;

use super::{status_label, Code, RpcStatus};
use crate::obs::{RequestMetrics, TYPE_GRPC};

/// What the server knows about one inbound unary call.
#[derive(Debug, Clone, Default)]
pub struct ServerCallInfo {
    /// Full method name, e.g. `/helloworld.Greeter/SayHello`.
    pub full_method: String,
    /// Calling service name, empty when unknown.
    pub peer: String,
    /// Calling service address, empty when unknown.
    pub peer_host: String,
}

impl ServerCallInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
            ..Self::default()
        }
    }

    pub fn peer(mut self, peer: impl Into<String>, peer_host: impl Into<String>) -> Self {
        self.peer = peer.into();
        self.peer_host = peer_host.into();
        self
    }
}

/// Server-side unary interceptor.
///
/// Records `server_handle_total` and `server_handle_seconds` with
/// `{full_method, type="grpc", status, peer, peer_host}`; `status` is `0` on
/// success, otherwise the error's code. Works with any handler returning
/// `Result<_, tonic::Status>`.
#[derive(Clone)]
pub struct ServerInterceptor {
    metrics: RequestMetrics,
}

impl ServerInterceptor {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self { metrics }
    }

    /// Interceptor over `RequestMetrics::global()`.
    pub fn global() -> Self {
        Self::new(RequestMetrics::global().clone())
    }

    pub async fn intercept<F, T, E>(&self, info: &ServerCallInfo, handler: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: RpcStatus,
    {
        let start = Instant::now();
        let res = handler.await;
        let code = match &res {
            Ok(_) => Code::Ok,
            Err(e) => e.code(),
        };
        self.metrics.record_server(
            &info.full_method,
            TYPE_GRPC,
            &status_label(code),
            &info.peer,
            &info.peer_host,
            start.elapsed(),
        );
        res
    }
}
