//! Web server module.

mod assets;
mod handlers;

pub use assets::*;
pub use handlers::*;

use crate::api::ApiClient;
use crate::config::ExplorerConfig;
use crate::theme::Theme;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ExplorerConfig,
    pub client: ApiClient,
    pub theme: Arc<Theme>,
}

/// Web server for the explorer.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ExplorerConfig, client: ApiClient, theme: Theme) -> Self {
        Self {
            state: AppState {
                config,
                client,
                theme: Arc::new(theme),
            },
        }
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = routes(self.state.clone());

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

/// Build the router with all routes.
pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        // Pages
        .route("/", get(handlers::handle_index))
        .route("/measurement", get(handlers::handle_measurement))
        .route("/charts/apps.svg", get(handlers::handle_app_chart_svg))
        // API endpoints
        .route("/api/charts/apps", get(handlers::handle_app_chart))
        .route("/healthz", get(handlers::handle_health))
        // Static assets
        .route("/static/{*path}", get(assets::handle_static))
        .route("/favicon.ico", get(assets::handle_favicon))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
