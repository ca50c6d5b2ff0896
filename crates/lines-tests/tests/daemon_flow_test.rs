//! Provider -> fetcher -> readiness -> subscription
//!
//! Wires the pieces together the way `linesd` does, against a mock provider.
//!
//! Run with: cargo test -p lines-tests --test daemon_flow_test

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lines_core::{LineStore, MemoryLineStore};
use lines_fetcher::{FetcherConfig, LinesFetcher};
use lines_tests::{wait_for, MockProvider, SubscriptionClient, TestServer};
use pretty_assertions::assert_eq;
use serde_json::Value;

const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

fn fetcher_config(provider: &MockProvider, sports: &[&str]) -> FetcherConfig {
    let sports = sports
        .iter()
        .map(|sport| (sport.to_string(), Duration::from_millis(200)))
        .collect::<HashMap<_, _>>();
    FetcherConfig::new(provider.base_url(), sports)
}

async fn ready_status(server: &TestServer) -> (u16, Value) {
    let response = reqwest::get(format!("{}/ready", server.base_url()))
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_ready_after_first_sync() {
    let provider = MockProvider::start().await.unwrap();
    provider.set_line("soccer", "1.5");
    provider.set_line("tennis", "2.0");

    let store: Arc<dyn LineStore> = Arc::new(MemoryLineStore::new());
    let server = TestServer::start_unready(store.clone()).await.unwrap();

    let (status, body) = ready_status(&server).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "not ok");

    let fetcher =
        LinesFetcher::new(store, fetcher_config(&provider, &["soccer", "tennis"])).unwrap();
    fetcher.start();

    let synced = tokio::time::timeout(SYNC_TIMEOUT, fetcher.wait_ready(Duration::from_millis(20)))
        .await
        .unwrap();
    assert!(synced);
    server.state.ready().set(true);

    let (status, body) = ready_status(&server).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    fetcher.stop().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_missing_sport_blocks_readiness() {
    let provider = MockProvider::start().await.unwrap();
    provider.set_line("soccer", "1.5");

    let store: Arc<dyn LineStore> = Arc::new(MemoryLineStore::new());
    let fetcher =
        LinesFetcher::new(store.clone(), fetcher_config(&provider, &["soccer", "baseball"]))
            .unwrap();
    fetcher.start();

    // soccer syncs, baseball keeps failing
    assert!(
        wait_for(
            || {
                let store = store.clone();
                async move { store.current("soccer").await.is_ok() }
            },
            SYNC_TIMEOUT,
        )
        .await
    );
    assert!(!fetcher.is_ready());
    assert_eq!(fetcher.pending_sports(), vec!["baseball".to_string()]);

    // The poller keeps retrying until the provider has the line
    provider.set_line("baseball", "0.85");
    let fetcher_ref = &fetcher;
    assert!(wait_for(move || async move { fetcher_ref.is_ready() }, SYNC_TIMEOUT).await);
    assert_eq!(store.current("baseball").await.unwrap().value, 0.85);

    fetcher.stop().await;
}

#[tokio::test]
async fn test_provider_changes_reach_subscriber() {
    let provider = MockProvider::start().await.unwrap();
    provider.set_line("soccer", "1.5");

    let store: Arc<dyn LineStore> = Arc::new(MemoryLineStore::new());
    let fetcher = LinesFetcher::new(store.clone(), fetcher_config(&provider, &["soccer"])).unwrap();
    fetcher.start();
    assert!(
        tokio::time::timeout(SYNC_TIMEOUT, fetcher.wait_ready(Duration::from_millis(20)))
            .await
            .unwrap()
    );

    let server = TestServer::start(store).await.unwrap();
    let mut client = SubscriptionClient::connect(&server.subscribe_url())
        .await
        .unwrap();
    client.subscribe(&["soccer"], 1).await.unwrap();

    let response = client.next_response(SYNC_TIMEOUT).await.unwrap();
    assert_eq!(response.deltas.get("soccer"), Some(&1.5));

    provider.set_line("soccer", "2.25");

    let mut total = 0.0;
    while total == 0.0 {
        let response = client.next_response(SYNC_TIMEOUT).await.unwrap();
        total = response.deltas["soccer"];
    }
    assert_eq!(total, 0.75);

    client.close().await;
    fetcher.stop().await;
    server.shutdown().await;
}
