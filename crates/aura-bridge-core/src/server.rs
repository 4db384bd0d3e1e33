//! Native bridge listener
//!
//! One tokio task per accepted connection, bounded by the admission limit:
//! - SO_REUSEADDR / SO_REUSEPORT on the listening socket
//! - a single bounded read per connection, request content ignored
//! - a canned JSON report written back, then the connection is closed

use crate::{ConnectionTracker, Engine, Error, ExecutionReport, ListenerConfig, Response, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace, warn};

/// Create a bound, listening, non-blocking TCP socket
pub fn create_listener_socket(addr: &SocketAddr, backlog: i32) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - allow several nodes on one port
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - inherited by accepted sockets
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(backlog)?;

    // Required before handing the socket to tokio
    socket.set_nonblocking(true)?;

    Ok(socket)
}

/// Per-connection request handler
///
/// Everything a handler needs, copied into each spawned task.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub engine: Engine,
    pub port: u16,
    pub read_buffer_size: usize,
    pub read_timeout: Option<Duration>,
}

impl Handler {
    /// Serve one connection: read once, answer with a report, close
    ///
    /// I/O errors are logged and otherwise ignored; the client always gets
    /// the same `200 OK` if the socket still accepts writes.
    pub async fn handle<S>(self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = vec![0u8; self.read_buffer_size];
        let read = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.read(&mut buffer)).await {
                Ok(read) => read,
                Err(_) => Err(std::io::ErrorKind::TimedOut.into()),
            },
            None => stream.read(&mut buffer).await,
        };
        match read {
            Ok(n) => trace!(bytes = n, "request read"),
            Err(e) => debug!(error = %e, "request read failed"),
        }

        let start = Instant::now();
        let engine = self.engine;
        let latency_ms = start.elapsed().as_millis() as u64;

        let report = ExecutionReport::success(engine, self.port, latency_ms);
        let body = match report.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "failed to serialize report");
                return;
            }
        };
        let bytes = Response::bridge_json(body).to_http1_bytes();

        if let Err(e) = stream.write_all(&bytes).await {
            debug!(error = %e, "response write failed");
            return;
        }
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "connection shutdown failed");
        }
    }
}

/// Bound bridge listener
pub struct Listener {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ListenerConfig,
    engine: Engine,
    tracker: Arc<ConnectionTracker>,
}

impl Listener {
    /// Bind the listening socket described by `config`
    ///
    /// Must be called from within a tokio runtime. Every failure here is a
    /// setup failure and is not retried.
    pub fn bind(config: ListenerConfig) -> Result<Self> {
        let addr = config.socket_addr()?;
        let socket = create_listener_socket(&addr, config.backlog)
            .map_err(|source| Error::Bind { addr, source })?;
        let listener = TcpListener::from_std(socket.into())
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let engine = Engine::for_port(local_addr.port(), config.rust_port);
        let tracker = Arc::new(ConnectionTracker::new(config.max_connections));

        Ok(Self {
            listener,
            local_addr,
            config,
            engine,
            tracker,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Engine reported by this listener
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Connection tracker shared with running handlers
    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        self.tracker.clone()
    }

    fn handler(&self) -> Handler {
        Handler {
            engine: self.engine,
            port: self.local_addr.port(),
            read_buffer_size: self.config.read_buffer_size,
            read_timeout: self.config.read_timeout,
        }
    }

    /// Accept connections forever
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves, then drain handlers
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let handler = self.handler();
        let Listener {
            listener,
            local_addr,
            config,
            engine,
            tracker,
        } = self;

        info!(version = crate::VERSION, "AuraCode native bridge");
        info!(port = local_addr.port(), addr = %local_addr, "node listening");
        info!(protocol = "HTTP/JSON-Bridge", context = engine.context(), "engine ready");

        tokio::pin!(shutdown);

        loop {
            let guard = tokio::select! {
                _ = &mut shutdown => break,
                guard = tracker.admit() => match guard {
                    Some(guard) => guard,
                    None => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };
            trace!(%peer, "connection accepted");

            tokio::spawn(async move {
                handler.handle(stream).await;
                drop(guard);
            });
        }

        // Stop accepting before waiting on in-flight handlers
        tracker.start_shutdown();
        drop(listener);

        let active = tracker.active();
        if tracker.drain(config.drain_timeout).await {
            info!(drained = active, "listener stopped");
        } else {
            warn!(
                remaining = tracker.active(),
                timeout_ms = config.drain_timeout.as_millis() as u64,
                "listener stopped before handlers drained"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(engine: Engine, port: u16) -> Handler {
        Handler {
            engine,
            port,
            read_buffer_size: 30_000,
            read_timeout: None,
        }
    }

    async fn exchange(handler: Handler, request: &[u8]) -> String {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(handler.handle(server));

        client.write_all(request).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        task.await.unwrap();

        String::from_utf8(response).unwrap()
    }

    fn split(response: &str) -> (&str, &str) {
        response.split_once("\r\n\r\n").unwrap()
    }

    #[tokio::test]
    async fn test_handle_writes_report() {
        let response = exchange(handler(Engine::Rust, 58000), b"GET / HTTP/1.1\r\n\r\n").await;
        let (head, body) = split(&response);

        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: application/json"));
        assert!(head.contains("Access-Control-Allow-Origin: *"));
        assert!(head.contains("Connection: close"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));

        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["engine"], "rust-native");
        assert_eq!(json["exit_code"], 0);
        assert!(json["latency_ms"].is_u64());
        assert!(json["stdout"].as_str().unwrap().contains("port 58000"));
    }

    #[tokio::test]
    async fn test_handle_ignores_garbage() {
        let response = exchange(handler(Engine::Cpp, 56000), &[0xff, 0x00, 0x13, b'{']).await;
        let (head, body) = split(&response);

        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["engine"], "cpp-native");
    }

    #[tokio::test]
    async fn test_handle_read_timeout_still_responds() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let handler = Handler {
            read_timeout: Some(Duration::from_millis(20)),
            ..handler(Engine::Cpp, 56000)
        };
        let task = tokio::spawn(handler.handle(server));

        // Nothing sent: the read times out and the handler answers anyway
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        task.await.unwrap();

        assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_create_listener_socket() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let socket = create_listener_socket(&addr, 5).unwrap();
        let local = socket.local_addr().unwrap().as_socket().unwrap();
        assert!(local.ip().is_loopback());
        assert_ne!(local.port(), 0);
        assert!(socket.reuse_address().unwrap());
    }

    #[tokio::test]
    async fn test_bind_reports_engine_from_port() {
        let listener = Listener::bind(ListenerConfig::new().hostname("127.0.0.1").port(0)).unwrap();
        assert_eq!(listener.engine(), Engine::Cpp);

        let port = listener.local_addr().port();
        let config = ListenerConfig::new().hostname("127.0.0.1").port(port).rust_port(port);
        let rust = Listener::bind(config).unwrap();
        assert_eq!(rust.engine(), Engine::Rust);
    }
}
