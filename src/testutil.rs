//! Helpers shared by the async tests.

use crate::config::ExplorerConfig;

use axum::Router;
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Configuration pointing both API base URLs at `base`.
pub fn test_config(base: &str) -> ExplorerConfig {
    ExplorerConfig {
        measurements_url: base.to_string(),
        api_url: base.to_string(),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}
