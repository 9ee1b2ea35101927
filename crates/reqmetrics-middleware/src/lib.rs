//! reqmetrics middleware library entry.
//!
//! Wires the core registry and vectors into request-handling surfaces:
//! axum HTTP middleware with a scrape route, unary RPC interceptors, builtin
//! process/runtime collectors, and YAML configuration. Consumed by the demo
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod http;
pub mod obs;
pub mod ops;
pub mod router;
pub mod rpc;
