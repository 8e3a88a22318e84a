//! Bounded group-chat WebSocket server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 127.0.0.1 --port 3000 --max-connections 4
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hiroba_server::{
    config::{
        DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_FRAME_BYTES, ServerConfig,
    },
    ui::Server,
};
use hiroba_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Bounded group-chat WebSocket server with history replay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "80")]
    port: u16,

    /// Maximum number of concurrent connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Number of chat messages kept for replay
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,

    /// Heartbeat period in seconds
    #[arg(long, default_value = "10")]
    heartbeat_interval_secs: u64,

    /// Maximum inbound frame size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    max_frame_bytes: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match ServerConfig::new(
        args.max_connections,
        args.history_capacity,
        Duration::from_secs(args.heartbeat_interval_secs),
        args.max_frame_bytes,
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Capacity {} connection(s), history {} message(s), heartbeat every {:?}",
        config.max_connections,
        config.history_capacity,
        config.heartbeat_interval
    );

    let server = Server::from_config(config, Arc::new(SystemClock));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
