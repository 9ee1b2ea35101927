//! Metric definitions and builtin collectors.
//!
//! - `request`: the four standard request vectors and their recording helpers
//! - `library`: client-library (database/cache) call counter
//! - `builtin`: process and runtime collectors registration

pub mod builtin;
pub mod library;
pub mod process;
pub mod request;
pub mod runtime;

pub use builtin::{register_builtins, BuiltinOptions};
pub use library::LibraryMetrics;
pub use request::{RequestMetrics, TYPE_GRPC, TYPE_HTTP};
