//! Warble server binary.
//!
//! # Usage
//!
//! ```bash
//! # Development: accept any credentials, verbose logging
//! warble-server --disable-auth --log-level debug
//!
//! # Advertise a public hostname
//! warble-server --oscar-host aim.example.net --bos-port 5190 --chat-port 5191
//! ```

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use warble_server::{Config, Server};

/// Warble OSCAR server
#[derive(Parser, Debug)]
#[command(name = "warble-server")]
#[command(about = "Legacy AIM/ICQ-compatible messaging server")]
#[command(version)]
struct Args {
    /// Hostname or IP advertised to clients
    #[arg(long, default_value = "127.0.0.1")]
    oscar_host: String,

    /// Main (BOS) service port
    #[arg(long, default_value = "5190")]
    bos_port: u16,

    /// Chat service port
    #[arg(long, default_value = "5191")]
    chat_port: u16,

    /// Accept unknown screen names and wrong passwords (development only)
    #[arg(long)]
    disable_auth: bool,

    /// Idle connection timeout in seconds
    #[arg(long, default_value = "300")]
    read_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("warble server starting");
    if args.disable_auth {
        tracing::warn!("authentication disabled - any credentials are accepted");
        tracing::warn!("this is NOT suitable for anything but development!");
    }

    let config = Config {
        oscar_host: args.oscar_host,
        bos_port: args.bos_port,
        chat_port: args.chat_port,
        disable_auth: args.disable_auth,
        read_timeout: std::time::Duration::from_secs(args.read_timeout_secs),
    };

    let server = Server::bind(config).await?;
    server.run().await?;

    Ok(())
}
