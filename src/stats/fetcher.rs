//! Fetch-once task for the app statistics time series.

use crate::api::{ApiClient, StatPoint, StatQuery};

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable state of a [`StatFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Loading,
    Loaded(Vec<StatPoint>),
    Failed(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }
}

/// Issues a single statistics request on activation.
///
/// The request runs in its own task. Deactivating (or dropping) the fetcher
/// cancels it; after `deactivate` returns the state never changes again.
pub struct StatFetcher {
    state: Arc<watch::Sender<FetchState>>,
    cancel: CancellationToken,
}

impl StatFetcher {
    /// Spawn the request and return the handle in the `Loading` state.
    pub fn activate(client: ApiClient, query: StatQuery) -> Self {
        let (tx, _) = watch::channel(FetchState::Loading);
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();

        tokio::spawn(run_fetch(
            client,
            query,
            state.clone(),
            cancel.clone(),
        ));

        Self { state, cancel }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Receiver notified on the (single) state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Wait until the request settles.
    ///
    /// Returns `None` if the fetcher is deactivated first.
    pub async fn wait(&self) -> Option<FetchState> {
        let mut rx = self.state.subscribe();
        tokio::select! {
            biased;
            settled = rx.wait_for(|s| !s.is_loading()) => settled.ok().map(|s| s.clone()),
            _ = self.cancel.cancelled() => None,
        }
    }

    /// Cancel the in-flight request and discard its result.
    pub fn deactivate(&self) {
        // Cancel while holding the state lock so a completing request either
        // published before this point or observes the cancellation.
        self.state.send_if_modified(|_| {
            self.cancel.cancel();
            false
        });
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for StatFetcher {
    fn drop(&mut self) {
        if self.is_active() {
            self.deactivate();
        }
    }
}

async fn run_fetch(
    client: ApiClient,
    query: StatQuery,
    state: Arc<watch::Sender<FetchState>>,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(
                "Cancelled app stats request for {} {} {}",
                query.probe_cc,
                query.probe_asn,
                query.test_name
            );
            return;
        }
        result = client.get_im_stats(&query) => result,
    };

    let next = match result {
        Ok(points) => FetchState::Loaded(points),
        Err(e) => {
            tracing::warn!(
                "App stats request failed for {} {} {}: {}",
                query.probe_cc,
                query.probe_asn,
                query.test_name,
                e
            );
            FetchState::Failed(e.to_string())
        }
    };

    state.send_if_modified(|current| {
        if cancel.is_cancelled() {
            return false;
        }
        *current = next;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_backend, test_config};
    use axum::{routing::get, Json, Router};
    use chrono::NaiveDate;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    fn query() -> StatQuery {
        StatQuery {
            probe_cc: "IT".to_string(),
            probe_asn: "AS30722".to_string(),
            test_name: "whatsapp".to_string(),
        }
    }

    fn stats_router(delay: Duration) -> Router {
        Router::new().route(
            "/api/_/im_stats",
            get(move || async move {
                tokio::time::sleep(delay).await;
                Json(serde_json::json!({
                    "results": [
                        {"test_day": "2020-01-01", "total_count": 5},
                        {"test_day": "2020-01-02", "total_count": 12}
                    ]
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_loads_points() {
        let base = spawn_backend(stats_router(Duration::ZERO)).await;
        let client = ApiClient::new(&test_config(&base)).unwrap();

        let fetcher = StatFetcher::activate(client, query());
        let state = fetcher.wait().await.unwrap();

        match state {
            FetchState::Loaded(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(
                    points[0].test_day,
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
                );
                assert_eq!(points[1].total_count, 12);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!fetcher.state().is_loading());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_explicit() {
        let router = Router::new().route(
            "/api/_/im_stats",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "down") }),
        );
        let base = spawn_backend(router).await;
        let client = ApiClient::new(&test_config(&base)).unwrap();

        let fetcher = StatFetcher::activate(client, query());
        let state = fetcher.wait().await.unwrap();
        assert!(matches!(state, FetchState::Failed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails() {
        // Bind and immediately drop a listener to get a closed port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&test_config(&format!("http://{}", addr))).unwrap();
        let fetcher = StatFetcher::activate(client, query());
        let state = fetcher.wait().await.unwrap();
        assert!(matches!(state, FetchState::Failed(_)));
    }

    #[tokio::test]
    async fn test_deactivate_discards_result() {
        let base = spawn_backend(stats_router(Duration::from_millis(200))).await;
        let client = ApiClient::new(&test_config(&base)).unwrap();

        let fetcher = StatFetcher::activate(client, query());
        let rx = fetcher.subscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;

        fetcher.deactivate();
        assert!(!fetcher.is_active());
        assert!(fetcher.wait().await.is_none());

        // Give the backend time to answer; nothing may be published.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fetcher.state(), FetchState::Loading);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_drop_cancels_request() {
        let base = spawn_backend(stats_router(Duration::from_millis(200))).await;
        let client = ApiClient::new(&test_config(&base)).unwrap();

        let fetcher = StatFetcher::activate(client, query());
        let mut rx = fetcher.subscribe();
        drop(fetcher);

        // The sender is released once the task exits, without a state change.
        let mut changed = task::spawn(async move { rx.changed().await });
        assert_pending!(changed.poll());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(changed.is_woken());
        let result = assert_ready!(changed.poll());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_at_most_one_transition() {
        let base = spawn_backend(stats_router(Duration::ZERO)).await;
        let client = ApiClient::new(&test_config(&base)).unwrap();

        let fetcher = StatFetcher::activate(client, query());
        let mut rx = fetcher.subscribe();
        rx.changed().await.unwrap();
        assert!(matches!(*rx.borrow_and_update(), FetchState::Loaded(_)));

        // Deactivating after completion leaves the loaded state in place.
        fetcher.deactivate();
        assert!(!rx.has_changed().unwrap());
        assert!(matches!(fetcher.state(), FetchState::Loaded(_)));
    }
}
