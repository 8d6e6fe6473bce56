//! Madoguchi session broker server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin madoguchi-server
//! cargo run --bin madoguchi-server -- --host 0.0.0.0 --port 3000 --admin-secret s3cret
//! ```

use std::sync::Arc;

use clap::Parser;
use madoguchi_server::{
    config::{DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_HOST, DEFAULT_PORT, ServerConfig},
    ui::Server,
};
use madoguchi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "madoguchi-server")]
#[command(about = "Session broker pairing one operator with queued participants", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Period of the low-priority (video frame) flush tick in milliseconds
    #[arg(long, default_value_t = DEFAULT_FLUSH_INTERVAL_MS)]
    flush_interval_ms: u64,

    /// Shared secret required for operator registration
    #[arg(long, env = "MADOGUCHI_ADMIN_SECRET", hide_env_values = true)]
    admin_secret: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = match ServerConfig::new(
        args.host,
        args.port,
        args.flush_interval_ms,
        args.admin_secret,
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    if config.admin_secret.is_none() {
        tracing::warn!("No admin secret configured; any client may register as operator");
    }

    let server = Server::new(&config, Arc::new(SystemClock));
    if let Err(e) = server.run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
