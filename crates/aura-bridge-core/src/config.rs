//! Listener configuration

use crate::{Error, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Default port, the C++ node
pub const CPP_PORT: u16 = 56000;

/// Port that selects the Rust engine
pub const RUST_PORT: u16 = 58000;

/// Listener configuration
///
/// Fixed for the lifetime of a [`Listener`](crate::Listener). Several
/// listeners with different configurations can run in one process.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub hostname: String,
    pub port: u16,
    /// Port whose listener reports the Rust engine
    pub rust_port: u16,
    /// Pending connection queue length passed to `listen`
    pub backlog: i32,
    /// Upper bound of the single read performed per connection
    pub read_buffer_size: usize,
    /// Maximum number of handlers running at once
    pub max_connections: usize,
    /// Bound on the request read, `None` waits forever
    pub read_timeout: Option<Duration>,
    /// How long shutdown waits for in-flight handlers
    pub drain_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: CPP_PORT,
            rust_port: RUST_PORT,
            backlog: 5,
            read_buffer_size: 30_000,
            max_connections: 1024,
            read_timeout: None,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

impl ListenerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn rust_port(mut self, port: u16) -> Self {
        self.rust_port = port;
        self
    }

    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Resolve `hostname:port` to the address the listener binds
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::InvalidAddress(format!("{}:{}: {}", self.hostname, self.port, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("{}:{}", self.hostname, self.port)))
    }
}
