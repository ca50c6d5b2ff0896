//! linesd - Sports Lines Daemon
//!
//! Polls the lines provider for every configured sport and streams line
//! deltas to WebSocket subscribers.
//!
//! Usage:
//!   linesd [OPTIONS]
//!
//! Every option can also be set through its environment variable
//! (`KLP_HTTP_ADDRESS`, `KLP_HTTP_PORT`, `KLP_LOG_LEVEL`, `FETCH_ADDRESS`,
//! `FETCH_PORT`, `FETCH_SPORTS`). Subscriptions are refused until every
//! sport has been fetched at least once.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use lines_api::{create_router, AppState};
use lines_core::{LineStore, MemoryLineStore};
use lines_fetcher::LinesFetcher;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Args, DaemonConfig, LogFormat, LogLevel};

/// Readiness poll period while waiting for the first sync
const READY_POLL: Duration = Duration::from_millis(500);

/// Upper bound on draining the HTTP server at shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

type ServerTask = JoinHandle<std::io::Result<()>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = DaemonConfig::load(&args).context("Invalid configuration")?;

    init_logging(config.log_level, config.log_format);

    tracing::info!("Starting linesd (Sports Lines Daemon)");
    tracing::debug!(?config, "Resolved configuration");

    run(config).await
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let level = level.as_str();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "linesd={level},lines_api={level},lines_core={level},lines_fetcher={level},tower_http={level}"
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let store: Arc<dyn LineStore> = Arc::new(MemoryLineStore::new());
    store.ping().await.context("Line store is unavailable")?;

    // Subscriptions hang off this token; cancelling it also drains the server
    let shutdown = CancellationToken::new();
    let state = AppState::new(store.clone()).with_shutdown(shutdown.clone());

    let listener = TcpListener::bind((config.http.address.as_str(), config.http.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.http.address, config.http.port
            )
        })?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let mut server: ServerTask = tokio::spawn(lines_api::serve(
        listener,
        create_router(state.clone()),
        shutdown.clone(),
    ));

    let fetcher = LinesFetcher::new(store, config.fetch.fetcher_config())
        .context("Failed to create lines fetcher")?;
    tracing::info!(
        provider = %config.fetch.base_url(),
        sports = config.fetch.sports.len(),
        "Starting lines fetcher"
    );
    fetcher.start();

    let synced = tokio::select! {
        synced = fetcher.wait_ready(READY_POLL) => Some(synced),
        _ = shutdown_signal() => {
            tracing::info!("Stopped before first synchronization (system signal)");
            Some(false)
        }
        result = &mut server => {
            log_server_exit(result);
            None
        }
    };

    // `true` once the server task has been joined
    let server_done = match synced {
        Some(true) => {
            state.ready().set(true);
            tracing::info!("All sports synchronized, accepting subscriptions");
            wait_for_stop(&mut server).await
        }
        Some(false) => false,
        None => true,
    };

    state.ready().set(false);
    shutdown.cancel();
    fetcher.stop().await;

    if !server_done {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, server).await {
            Ok(result) => log_server_exit(result),
            Err(_) => tracing::warn!(
                "HTTP server did not stop within {:?}, abandoning it",
                SHUTDOWN_TIMEOUT
            ),
        }
    }

    tracing::info!("linesd stopped");
    Ok(())
}

/// Serve until a signal arrives or the server dies; `true` if the server task finished
async fn wait_for_stop(server: &mut ServerTask) -> bool {
    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Application stopped (system signal)");
            false
        }
        result = server => {
            log_server_exit(result);
            true
        }
    }
}

fn log_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::info!("HTTP server stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
