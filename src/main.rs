//! Relief API server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ trace / request-id / security headers
//!                     → client resolution (masked address)
//!                     → access log + performance counters → panic recovery
//!                     → rate limiter (peer address) → CORS guard
//!                     → JSON layer errors → body limit → timeout
//!                     → /health | /charities | /analytics  (also under /api)
//!     ◀────────────── JSON response
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use tokio::net::TcpListener;

use relief_api::config::load_runtime_config;
use relief_api::directory::Directory;
use relief_api::lifecycle::signals::spawn_signal_listener;
use relief_api::observability::{logging, metrics};
use relief_api::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "relief-api", version, about = "Charity directory and donation analytics API")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "RELIEF_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, overrides) = load_runtime_config(args.config.as_deref())?;
    logging::init_logging(&config.observability);
    for outcome in &overrides {
        outcome.log();
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relief-api starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let directory = match &config.directory.catalog_path {
        Some(path) => Directory::from_json_file(Path::new(path))?,
        None => Directory::builtin(Utc::now()),
    };
    tracing::info!(
        charities = directory.len(),
        verified = directory.verified_count(),
        "Charity catalog loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, directory)?;
    server.run(listener, shutdown.subscribe()).await?;

    signals.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}
