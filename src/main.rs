//! rapd - RAP register daemon
//!
//! Serves an in-memory register file over UDP.

use rap_server::{Config, Server};
use rap_transport::UdpTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if RAP_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("RAP_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    let udp_config = config.udp_config();
    let transport = UdpTransport::bind(&udp_config)?;

    tracing::info!("Starting rapd");
    tracing::info!("  Bind address: {}", transport.local_addr()?);
    match config.network.remote_addr {
        Some(remote) => tracing::info!("  Remote: {}", remote),
        None => tracing::info!("  Remote: reply to sender"),
    }
    tracing::info!("  Max message size: {}", udp_config.max_message_size());
    tracing::info!(
        "  Registers: {:#x}..{:#x}",
        config.registers.base,
        config.registers.base.saturating_add(config.registers.size)
    );

    let target = Arc::new(config.register_target());
    let server = Server::start(
        Box::new(transport),
        target,
        config.profile,
        config.server_config(),
    )?;

    // Ctrl+C stops the worker. The worker may also stop on its own.
    let (signal_tx, signal_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    })?;

    while server.is_running() {
        if signal_rx.recv_timeout(SHUTDOWN_POLL).is_ok() {
            tracing::info!("Received shutdown signal, stopping server...");
            server.shutdown();
            break;
        }
    }

    server.join()?;
    tracing::info!("Server stopped");
    Ok(())
}
