//! OONI Explorer - measurement pages and app statistics charts
//!
//! Renders measurements fetched from the OONI backend API.

mod api;
mod config;
mod html;
mod measurement;
mod stats;
mod theme;
mod web;

#[cfg(test)]
mod testutil;

use api::ApiClient;
use config::ExplorerConfig;
use theme::Theme;
use web::Server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("ooni_explorer=info".parse()?))
        .init();

    // Load configuration
    let cfg = ExplorerConfig::load();
    tracing::info!("Starting OONI Explorer on port {}...", cfg.http_port);
    tracing::info!("Using measurements API at {}", cfg.measurements_url);
    if cfg.api_url != cfg.measurements_url {
        tracing::info!("Using statistics API at {}", cfg.api_url);
    }

    let client = ApiClient::new(&cfg)?;

    // Start web server
    let server = Server::new(cfg, client, Theme::default());
    server.start().await?;

    Ok(())
}
