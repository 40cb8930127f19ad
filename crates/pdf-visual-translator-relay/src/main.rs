//! PDF Visual Translator Relay - forwards DeepSeek chat requests.
//!
//! Lets clients that cannot call the upstream API directly (CORS, network
//! policy) reach it through a single endpoint. The relay stores no
//! credentials; each request brings its own key.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::{DEFAULT_UPSTREAM_URL, RelayState};

#[derive(Parser, Debug)]
#[command(name = "pdf-visual-translator-relay")]
#[command(author, version, about = "Relay for DeepSeek translation requests", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Upstream chat-completions URL
    #[arg(long, env = "DEEPSEEK_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let state = Arc::new(
        RelayState::new(args.upstream_url.clone(), Duration::from_secs(args.timeout_secs))
            .context("Failed to initialize relay state")?,
    );

    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!(
        "Relaying http://{}{} to {}",
        addr,
        routes::RELAY_PATH,
        args.upstream_url
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
