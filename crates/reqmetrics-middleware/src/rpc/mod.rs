//! Unary RPC interceptors (client and server).
//!
//! An interceptor wraps the future of one unary call, records after it
//! completes, and hands the call's result back untouched. Status codes are
//! `tonic::Code`; `tonic::Status` errors are read directly, other error types
//! opt in through `RpcStatus`.

pub mod client;
pub mod server;

pub use client::ClientInterceptor;
pub use server::{ServerCallInfo, ServerInterceptor};
pub use tonic::Code;

/// Errors that carry a gRPC status code.
pub trait RpcStatus {
    fn code(&self) -> Code;
}

impl RpcStatus for tonic::Status {
    fn code(&self) -> Code {
        tonic::Status::code(self)
    }
}

impl RpcStatus for Code {
    fn code(&self) -> Code {
        *self
    }
}

/// Decimal form used as the `status` label (`Ok` is `"0"`).
pub fn status_label(code: Code) -> String {
    i32::from(code).to_string()
}
