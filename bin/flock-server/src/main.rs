//! flock-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Wire the swarm core (stores, registry, leases, beacon, router).
//! 4. Start the registration heartbeat.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod engine;
mod error;
mod middleware;
mod routes;
mod schemas;
mod state;
mod store;
#[cfg(test)]
mod testutil;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use flock_swarm::{
    Beacon, FederatedRouter, HttpTransport, LeaseManager, MemoryClaimStore, MemoryPeerStore,
    Registry, SystemClock,
};

use crate::config::Config;
use crate::engine::HttpEngine;
use crate::state::{AppState, RenewalManager};
use crate::store::MemoryModelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: FLOCK_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "flock-server starting");

    // ── 3. Swarm core ──────────────────────────────────────────────────────────
    let store = Arc::new(MemoryModelStore::new());
    let engine = Arc::new(HttpEngine::new(&cfg.engine_url));
    let transport = Arc::new(HttpTransport::new());
    let clock = Arc::new(SystemClock);

    let registry = Arc::new(Registry::new(
        Arc::new(MemoryPeerStore::new()),
        clock.clone(),
        Duration::from_millis(cfg.staleness_ms),
    ));
    let leases = Arc::new(LeaseManager::new(Arc::new(MemoryClaimStore::new()), clock));
    let beacon = Arc::new(Beacon::new(
        transport.clone(),
        store.clone(),
        cfg.registry_url.clone(),
        env!("CARGO_PKG_VERSION"),
    ));
    let router = Arc::new(FederatedRouter::new(
        transport.clone(),
        store.clone(),
        engine.clone(),
        cfg.public_url.clone(),
        cfg.registry_url.clone(),
    ));

    info!(
        public_url = %cfg.public_url,
        registry_url = %cfg.registry_url,
        "swarm core initialised"
    );

    // ── 4. Shared application state + heartbeat ────────────────────────────────
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store,
        engine,
        transport,
        registry,
        leases,
        beacon: beacon.clone(),
        router,
        renewals: Arc::new(RenewalManager::new()),
    });

    beacon.ensure_heartbeat(&cfg.public_url, Duration::from_millis(cfg.heartbeat_ms));
    info!(interval_ms = cfg.heartbeat_ms, "registration heartbeat started");

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("flock-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
