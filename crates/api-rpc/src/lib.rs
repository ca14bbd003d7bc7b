//! JSON-RPC API Layer
//!
//! Serves fund summaries, analysis tables, chart series and cache
//! administration over JSON-RPC 2.0 (HTTP).

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};
