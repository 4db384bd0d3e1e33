//! Error types for aura-bridge-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the bridge node
#[derive(Debug, Error)]
pub enum Error {
    /// Socket creation, option setting, bind or listen failed
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Hostname and port do not form a socket address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
