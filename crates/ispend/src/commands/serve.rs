//! Serve command - runs the HTTP API.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use ispend_cache::CacheConfig;
use ispend_config::{IspendConfig, StoreKind};
use ispend_domain::{DomainServices, SessionConfig, spawn_sweeper};
use ispend_server::{Server, ServerConfig};
use ispend_store::{InMemoryStore, SpenderStore, SqliteStore};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Loaded config"),
        None => info!("No config file found, using defaults"),
    }
    let config = loaded.config;

    let bind_address = bind_address(&config, &args)?;
    let store = open_store(&config)?;

    let mut session_config =
        SessionConfig::new().with_sweep_interval(config.sessions.sweep_interval());
    if let Some(ttl) = config.sessions.ttl() {
        session_config = session_config.with_ttl(ttl);
    }

    let services = DomainServices::new(store.clone(), cache_config(&config), session_config)
        .context("failed to load users from the store")?;
    let sweeper = spawn_sweeper(services.sessions().clone());

    if ctx.verbose {
        println!("Store: {:?}", config.store.kind);
        println!("Users: {}", services.directory().user_count());
    }
    println!("ispend listening on http://{bind_address}");

    let server = Server::new(services, ServerConfig::new().with_bind_address(bind_address));

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }
    store.close()?;
    Ok(())
}

fn bind_address(config: &IspendConfig, args: &ServeArgs) -> Result<SocketAddr> {
    let host = args.bind.as_deref().unwrap_or(&config.server.host);
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid bind address: {host}"))?;
    Ok(SocketAddr::new(ip, args.port.unwrap_or(config.server.port)))
}

fn open_store(config: &IspendConfig) -> Result<Arc<dyn SpenderStore>> {
    match config.store.kind {
        StoreKind::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(InMemoryStore::with_default_spend_kinds()))
        }
        StoreKind::Sqlite => {
            let path = config
                .store
                .path
                .as_deref()
                .context("store.path is required for the sqlite store")?;
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = SqliteStore::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!(path = %path.display(), "Using SQLite store");
            Ok(Arc::new(store))
        }
    }
}

fn cache_config(config: &IspendConfig) -> CacheConfig {
    CacheConfig::new()
        .with_max_entries(config.cache.max_entries)
        .with_max_cost(config.cache.max_cost)
}
