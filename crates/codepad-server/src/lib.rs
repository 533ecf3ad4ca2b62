//! Codepad Server - HTTP surface for the playground backend
//!
//! Wires the execution service and the assistant proxy behind a small warp
//! route tree, with TOML configuration and `tracing` logging.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use routes::routes;
pub use state::AppState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
