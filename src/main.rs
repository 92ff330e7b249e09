//! Microservice relay gateway.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (trace, request id, timeout)
//!                        → middleware (remote user, access control)
//!                        → lookup prefix → ServiceDefinition
//!                        → proxy::ProxyService
//!                        → transport (pooled reqwest, connect retries) ─────▶ Downstream
//!     Client Response                                                        Service
//!     ◀───────────── http::response ◀── ResponseEnvelope ◀─────────────────────
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use microservice_relay::config::load_config;
use microservice_relay::lifecycle::{signals, startup, Shutdown};
use microservice_relay::observability::{logging, metrics};
use microservice_relay::HttpServer;

#[derive(Parser)]
#[command(name = "microservice-relay")]
#[command(about = "Gateway relaying requests to configured microservices", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!("microservice-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let definitions = startup::build(&config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = definitions.len(),
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(&config, definitions);
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
