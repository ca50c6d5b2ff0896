//! Background polling of every configured sport

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use lines_core::{LineStore, Point};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::error::FetchResult;
use crate::provider::LinesProvider;

/// Polls the lines provider and writes every sport into the store
pub struct LinesFetcher {
    provider: LinesProvider,
    store: Arc<dyn LineStore>,
    sports: HashMap<String, Duration>,
    /// Sports that have not been synchronized yet
    not_synced: Arc<RwLock<HashSet<String>>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LinesFetcher {
    pub fn new(store: Arc<dyn LineStore>, config: FetcherConfig) -> FetchResult<Self> {
        let provider = LinesProvider::new(&config.base_url, config.request_timeout)?;
        let not_synced = config.sports.keys().cloned().collect();

        Ok(Self {
            provider,
            store,
            sports: config.sports,
            not_synced: Arc::new(RwLock::new(not_synced)),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Spawn one polling task per sport. Does not block.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            warn!("Lines fetcher already started");
            return;
        }

        info!(sports = self.sports.len(), "Starting fetching lines from lines provider");

        for (sport, interval) in &self.sports {
            let poller = SportPoller {
                provider: self.provider.clone(),
                store: self.store.clone(),
                sport: sport.clone(),
                interval: *interval,
                not_synced: self.not_synced.clone(),
                cancel: self.cancel.child_token(),
            };
            tasks.push(tokio::spawn(poller.run()));
        }
    }

    /// Whether every sport was synchronized at least once
    pub fn is_ready(&self) -> bool {
        self.not_synced.read().is_empty()
    }

    /// Sports still waiting for their first successful fetch
    pub fn pending_sports(&self) -> Vec<String> {
        let mut pending: Vec<String> = self.not_synced.read().iter().cloned().collect();
        pending.sort();
        pending
    }

    /// Poll readiness until every sport is synchronized.
    ///
    /// Returns `false` if the fetcher is stopped first.
    pub async fn wait_ready(&self, poll: Duration) -> bool {
        loop {
            if self.is_ready() {
                return true;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    /// Stop all polling tasks and wait for them to exit
    pub async fn stop(&self) {
        info!("Stopping lines fetcher");
        self.cancel.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }
}

struct SportPoller {
    provider: LinesProvider,
    store: Arc<dyn LineStore>,
    sport: String,
    interval: Duration,
    not_synced: Arc<RwLock<HashSet<String>>>,
    cancel: CancellationToken,
}

impl SportPoller {
    async fn run(self) {
        debug!(sport = %self.sport, interval_secs = self.interval.as_secs(), "Sport poller started");

        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.update() => result,
            };

            match result {
                Ok(value) => {
                    if self.not_synced.write().remove(&self.sport) {
                        info!(sport = %self.sport, value, "Sport synchronized");
                    }
                }
                Err(e) => {
                    warn!(sport = %self.sport, error = %e, "Failed to update sport from lines provider");
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(sport = %self.sport, "Sport poller stopped");
    }

    async fn update(&self) -> FetchResult<f64> {
        let value = self.provider.fetch(&self.sport).await?;
        self.store.put_point(&self.sport, Point::now(value)).await?;
        Ok(value)
    }
}
