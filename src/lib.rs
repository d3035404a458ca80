//! Context-scoped structured logging.
//!
//! Fields accumulate on an immutable [`context::Context`] as a request moves
//! through the code; each emit on the [`logger::Logger`] merges them with
//! call-site fields and registry lookups into one JSON line. Error-level
//! emits are also forwarded to an error tracker through
//! [`bridge::ErrorBridge`], and [`access_log::AccessLogLayer`] writes one
//! record per HTTP request.

pub mod error;
pub mod level;
pub mod field;
pub mod context;
pub mod registry;
pub mod merge;
pub mod record;
pub mod sink;
pub mod event;
pub mod bridge;
pub mod logger;
pub mod access_log;
pub mod layer;

#[cfg(feature = "http-sink")]
pub mod http_sink;

pub mod env;
pub mod init;
pub mod noop_sink;
pub mod memory_sink;
