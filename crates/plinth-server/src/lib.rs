//! HTTP server for the Plinth content API.
//!
//! This crate exposes the read-only JSON API of `plinth-site` over axum:
//! - `/languages/` for the current site's languages
//! - `/{language}/pages-tree/`, `/{language}/pages-root/` and
//!   `/{language}/pages/{path}` for page metadata
//! - `/{language}/placeholders/{content_type}/{object_id}/{slot}/` for
//!   rendered placeholder content (`?html=1` adds a live HTML rendering)
//! - `/{language}/aliases/` for the URLs pages answer to
//!
//! All routes are mounted under the configured API prefix.
//!
//! # Quick Start
//!
//! ```ignore
//! use plinth_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         snapshot: "content.yaml".into(),
//!         version: "1.0.0".to_owned(),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum router (plinth-server)
//!                       │
//!                       ├─► viewer + request context (Authorization, Host)
//!                       │
//!                       └─► ContentApi (plinth-site)
//!                               │
//!                               ├─► ContentStore (YAML snapshot)
//!                               └─► Cache (memory, file or none)
//! ```

mod app;
mod auth;
mod config;
mod error;
mod handlers;
mod middleware;
mod request;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use plinth_cache::{Cache, FileCache, MemoryCache, NullCache};
use plinth_site::{ApiSettings, ContentApi, Language, PluginRegistry, SiteSettings};
use plinth_store::{DefaultPolicy, MemoryStore};
use state::AppState;

pub use auth::ApiToken;
pub use config::{plugin_registry, server_config_from_config};

/// Where rendered placeholder content is cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStore {
    /// In-process memory, lost on restart.
    Memory,
    /// Files below the given directory.
    File(PathBuf),
    /// Nothing is cached.
    None,
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Scheme used in API links when the proxy sends no `X-Forwarded-Proto`.
    pub scheme: String,
    /// Path prefix the API routes are mounted under.
    pub api_prefix: String,
    /// YAML content snapshot to serve.
    pub snapshot: PathBuf,
    /// Cache store for placeholder content.
    pub cache: CacheStore,
    /// Sites, templates and cache settings of the content API.
    pub settings: ApiSettings,
    /// Registered plugin types.
    pub plugins: PluginRegistry,
    /// Static API tokens.
    pub tokens: Vec<ApiToken>,
    /// Enable verbose output.
    pub verbose: bool,
    /// Application version (for cache and `ETag` invalidation).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            scheme: "http".to_owned(),
            api_prefix: "/api".to_owned(),
            snapshot: PathBuf::from("content.yaml"),
            cache: CacheStore::Memory,
            settings: ApiSettings::new(
                SiteSettings::new(1, "localhost").with_language(Language::new("en", "English")),
            ),
            plugins: PluginRegistry::new(),
            tokens: Vec::new(),
            verbose: false,
            version: String::new(),
        }
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the content snapshot cannot be loaded or the server
/// fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::from_yaml_file(&config.snapshot)?;
    tracing::info!(snapshot = %config.snapshot.display(), "Loaded content snapshot");

    let cache = open_cache(&config.cache, &config.version);
    let api = ContentApi::new(
        Arc::new(store),
        Arc::new(DefaultPolicy),
        cache.as_ref(),
        config.settings.clone(),
        config.plugins.clone(),
    );

    let state = Arc::new(AppState {
        api,
        tokens: config.tokens.clone(),
        scheme: config.scheme.clone(),
        api_prefix: normalize_prefix(&config.api_prefix),
        verbose: config.verbose,
        version: config.version.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, prefix = %config.api_prefix, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn open_cache(store: &CacheStore, version: &str) -> Box<dyn Cache> {
    match store {
        CacheStore::Memory => Box::new(MemoryCache::new()),
        CacheStore::File(dir) => {
            tracing::info!(dir = %dir.display(), "Using file cache");
            Box::new(FileCache::new(dir.clone(), version))
        }
        CacheStore::None => Box::new(NullCache),
    }
}

/// Strip trailing slashes; the root prefix becomes empty.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_owned()
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
