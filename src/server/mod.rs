// src/server/mod.rs

//! Pinion HTTP server - asynchronous requirement resolution
//!
//! This module provides an HTTP server that:
//! - Accepts requirement-set submissions and admits them as jobs
//! - Runs the research/resolve/compile pipeline in the background
//! - Serves job status and final reports for polling by job ID
//!
//! Submissions return immediately with a job ID; total analysis time is
//! decoupled from request latency because registry lookups for a large
//! requirement set can take tens of seconds.

pub mod config;
mod handlers;
pub mod pipeline;
mod routes;

pub use config::PinionConfig;
pub use pipeline::spawn_pipeline;
pub use routes::create_router;

use crate::registry::{MetadataCache, MetadataSource, PypiClient};
use crate::research::ResearchUnit;
use crate::store::JobStore;
use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Path to the job store database
    pub db_path: PathBuf,
    /// Base URL of the PyPI-compatible JSON API
    pub registry_url: String,
    /// Request timeout for registry fetches
    pub registry_timeout: Duration,
    /// TTL for cached registry metadata
    pub cache_ttl: Duration,
    /// TTL for terminal job records before pruning
    pub job_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().expect("valid default bind address"),
            db_path: PathBuf::from("/var/lib/pinion/jobs.db"),
            registry_url: "https://pypi.org/pypi".to_string(),
            registry_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            job_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

/// Shared server state
///
/// Every member is internally synchronized (the store behind a mutex,
/// the cache behind an RwLock), so handlers share a plain `Arc`.
pub struct ServerState {
    pub config: ServerConfig,
    pub store: JobStore,
    pub research: ResearchUnit,
    pub cache: Arc<MetadataCache>,
}

impl ServerState {
    /// Create state backed by the real registry client
    pub fn new(config: ServerConfig) -> crate::error::Result<Self> {
        let client = PypiClient::new(&config.registry_url, config.registry_timeout)?;
        Self::with_source(config, Arc::new(client))
    }

    /// Create state with a custom metadata source (used by tests)
    pub fn with_source(
        config: ServerConfig,
        source: Arc<dyn MetadataSource>,
    ) -> crate::error::Result<Self> {
        let store = if config.db_path.to_str() == Some(":memory:") {
            JobStore::in_memory()?
        } else {
            JobStore::open(&config.db_path)?
        };
        let cache = Arc::new(MetadataCache::new(config.cache_ttl));
        let research = ResearchUnit::new(source, cache.clone());

        Ok(Self {
            config,
            store,
            research,
            cache,
        })
    }
}

/// Start the Pinion server
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Pinion server on {}", config.bind_addr);
    tracing::info!("Job store: {:?}", config.db_path);
    tracing::info!("Registry: {}", config.registry_url);
    tracing::info!(
        "Metadata cache TTL: {}s, job TTL: {}s",
        config.cache_ttl.as_secs(),
        config.job_ttl.as_secs()
    );

    let state = Arc::new(ServerState::new(config.clone())?);

    // Background cache cleanup and job expiry
    let maintenance_state = state.clone();
    tokio::spawn(async move {
        run_maintenance_loop(maintenance_state).await;
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Pinion is ready to serve");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Background maintenance loop
///
/// Runs every 5 minutes: prunes expired metadata-cache entries and
/// deletes terminal job records older than the job TTL.
async fn run_maintenance_loop(state: Arc<ServerState>) {
    let interval = Duration::from_secs(5 * 60);

    loop {
        tokio::time::sleep(interval).await;

        let removed = state.cache.cleanup().await;
        if removed > 0 {
            tracing::debug!("Metadata cache cleanup: removed {} expired entries", removed);
        }

        match state.store.cleanup_expired(state.config.job_ttl) {
            Ok(removed) if removed > 0 => {
                tracing::debug!("Job cleanup: removed {} expired jobs", removed);
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Job cleanup error: {}", e),
        }
    }
}
