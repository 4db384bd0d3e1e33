//! aura-bridge-core: native bridge node
//!
//! A TCP listener that answers every HTTP connection with a canned JSON
//! execution report. The request is read but never interpreted.
//!
//! ## Modules
//! - `config` - listener configuration
//! - `engine` - language context selected by port
//! - `report` - JSON execution report
//! - `response` - HTTP/1.1 response encoding
//! - `server` - socket setup, accept loop and per-connection handler
//! - `tracker` - admission limit and in-flight handler accounting

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod response;
pub mod server;
pub mod tracker;

// Re-exports
pub use config::ListenerConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use report::ExecutionReport;
pub use response::{Response, ResponseBuilder, StatusCode};
pub use server::{create_listener_socket, Handler, Listener};
pub use tracker::{ConnectionGuard, ConnectionTracker};

/// Version reported in the startup banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
