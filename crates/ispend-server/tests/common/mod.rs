//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use ispend_cache::CacheConfig;
use ispend_domain::{DomainServices, SessionConfig};
use ispend_server::{SESSION_HEADER, Server, ServerConfig};
use ispend_store::{InMemoryStore, SpenderStore};

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client for this server.
    pub client: Client,
    /// Services behind the server, for direct inspection.
    pub services: DomainServices,
    /// Handle to the server task.
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server over an in-memory store.
    pub async fn start() -> Result<Self> {
        Self::start_with_store(Arc::new(InMemoryStore::with_default_spend_kinds())).await
    }

    /// Start a server over the given store.
    pub async fn start_with_store(store: Arc<dyn SpenderStore>) -> Result<Self> {
        let services = DomainServices::new(store, CacheConfig::default(), SessionConfig::default())?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = ServerConfig::new().with_bind_address(addr);
        let server = Server::new(services.clone(), config);
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            services,
            handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// GET with the session header.
    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header(SESSION_HEADER, token)
    }

    /// POST with the session header.
    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header(SESSION_HEADER, token)
    }

    /// DELETE with the session header.
    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header(SESSION_HEADER, token)
    }

    /// Register `username` with password `secret`.
    pub async fn register(&self, username: &str) -> Result<reqwest::Response> {
        let email = format!("{username}@example.com");
        Ok(self
            .client
            .post(self.url("/users"))
            .form(&[("username", username), ("password", "secret"), ("email", email.as_str())])
            .send()
            .await?)
    }

    /// Log `username` in and return the session token.
    pub async fn login(&self, username: &str) -> Result<String> {
        let body: Value = self
            .client
            .post(self.url("/users/login"))
            .form(&[("username", username), ("password", "secret")])
            .send()
            .await?
            .json()
            .await?;
        body["data"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("no token in {body}"))
    }

    /// Register and log in.
    pub async fn signup(&self, username: &str) -> Result<String> {
        let resp = self.register(username).await?;
        anyhow::ensure!(resp.status().is_success(), "register failed: {}", resp.status());
        self.login(username).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
