use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::{error, info};

use beacon::api;
use beacon::config::Config;
use beacon::tracking::{LoggingHandler, PixelTracker};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Pixel tracking server", long_about = None)]
struct Cli {
    /// Bind host, overrides HOST
    #[arg(long)]
    host: Option<String>,
    /// Bind port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    info!("Loaded configuration");

    if config.tracker.disable_cookies {
        info!("🍪 Identity cookies are disabled");
    } else {
        info!(
            "🍪 Issuing identity cookie '{}' (max-age {}s)",
            config.tracker.cookie_name, config.tracker.max_age
        );
    }
    if !config.tracker.track_ip {
        info!("🔒 Client IP tracking is disabled");
    }

    let tracker = PixelTracker::new(config.tracker.clone())?;
    tracker.use_handler(LoggingHandler);

    let app = api::create_router(tracker.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Pixel tracker listening on http://{}", addr);
    info!("   - Test page: http://{}/", addr);
    info!("   - Pixel endpoint: http://{}/pixel.gif", addr);
    info!("   - Stats endpoint: http://{}/stats", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(
        pending = tracker.pending_captures(),
        "Server stopped, draining in-flight captures..."
    );
    tracker.drain().await;
    info!("Captures drained, exiting");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
