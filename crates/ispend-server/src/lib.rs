//! HTTP API for the ispend expense tracker.
//!
//! Thin transport over the domain services: form and path parsing,
//! session-token checks, and the JSON response envelope.
//!
//! # Example
//!
//! ```ignore
//! use ispend_server::{AppState, Server, ServerConfig};
//!
//! let services = DomainServices::new(store, CacheConfig::default(), SessionConfig::default())?;
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! let server = Server::new(services, config);
//! server.run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{SESSION_HEADER, authorize, session_token};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use ispend_domain::DomainServices;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The ispend HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over the given services.
    pub fn new(services: DomainServices, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(services, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(Self::user_routes())
            .merge(Self::spending_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    fn user_routes() -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route(
                "/users",
                get(routes::list_users_handler).post(routes::register_handler),
            )
            .route("/users/login", post(routes::login_handler))
            .route("/users/login/check", post(routes::check_session_handler))
            .route("/users/logout", post(routes::logout_handler))
            .route("/users/me", get(routes::me_handler))
            .route("/users/{username}", get(routes::get_user_handler))
    }

    fn spending_routes() -> Router<AppState> {
        use axum::routing::{delete, get, post};

        Router::new()
            .route("/spending", post(routes::new_spending_handler))
            .route(
                "/spending/{username}/{spend_id}",
                delete(routes::delete_spending_handler),
            )
            .route(
                "/spending/id/{id}/{username}",
                get(routes::get_spending_handler),
            )
            .route("/spending/all/{username}", get(routes::list_spends_handler))
            .route("/spending/kind", get(routes::default_spend_kinds_handler))
            .route(
                "/spending/kind/{username}",
                get(routes::spend_kinds_handler),
            )
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = self.router();

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "Starting server");
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {e}")))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use ispend_cache::CacheConfig;
    use ispend_domain::SessionConfig;
    use ispend_store::InMemoryStore;
    use tower::ServiceExt;

    use crate::routes::HealthResponse;

    fn create_test_server() -> Server {
        let store = Arc::new(InMemoryStore::with_default_spend_kinds());
        let services =
            DomainServices::new(store, CacheConfig::default(), SessionConfig::default()).unwrap();
        Server::new(services, ServerConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
        assert_eq!(health.users, 0);
    }

    #[tokio::test]
    async fn test_default_spend_kinds_need_no_session() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/spending/kind")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["isError"], false);
        assert_eq!(json["data"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_protected_route_without_header() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/spending/all/alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["isError"], true);
        assert_eq!(json["status"], 401);
        assert_eq!(json["message"], "must be logged in");
    }

    #[tokio::test]
    async fn test_register_missing_password() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("username=alice"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "missing password");
    }

    #[test]
    fn test_bind_address() {
        let server = create_test_server();
        assert_eq!(server.bind_address().port(), 8080);
    }
}
