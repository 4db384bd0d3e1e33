//! AuraBridge native node
//!
//! Usage: `aura-bridge [PORT]`. Port 58000 reports the Rust engine, any
//! other port the C++ engine.

use aura_bridge_core::config::{CPP_PORT, RUST_PORT};
use aura_bridge_core::{Listener, ListenerConfig};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aura-bridge")]
#[command(about = "Native execution bridge node answering with JSON reports")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(default_value_t = CPP_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port that reports the Rust engine
    #[arg(long, default_value_t = RUST_PORT)]
    rust_port: u16,

    /// Maximum number of connections handled at once
    #[arg(long, default_value_t = 1024)]
    max_connections: usize,

    /// Pending connection queue length
    #[arg(long, default_value_t = 5)]
    backlog: i32,

    /// Runtime worker threads
    #[arg(long, default_value_t = num_cpus::get())]
    workers: usize,
}

impl Cli {
    fn listener_config(&self) -> ListenerConfig {
        ListenerConfig::new()
            .hostname(self.host.clone())
            .port(self.port)
            .rust_port(self.rust_port)
            .max_connections(self.max_connections)
            .backlog(self.backlog)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cli.workers.max(1))
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        let listener = Listener::bind(cli.listener_config())?;
        listener
            .run_until(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown signal received");
                }
            })
            .await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bridge node failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["aura-bridge"]);
        assert_eq!(cli.port, 56000);
        assert_eq!(cli.rust_port, 58000);
        let config = cli.listener_config();
        assert_eq!(config.hostname, "0.0.0.0");
        assert_eq!(config.backlog, 5);
        assert_eq!(config.max_connections, 1024);
    }

    #[test]
    fn test_positional_port() {
        let cli = Cli::parse_from(["aura-bridge", "58000", "--max-connections", "16"]);
        let config = cli.listener_config();
        assert_eq!(config.port, 58000);
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["aura-bridge", "notaport"]).is_err());
        assert!(Cli::try_parse_from(["aura-bridge", "70000"]).is_err());
    }
}
