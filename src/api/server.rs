//! HTTP stats API

use crate::config::BotConfig;
use crate::error::Result;
use crate::storage::StorageBackend;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Name reported by `GET /`
    pub name: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
            name: "buttbot Mini Stats API".to_string(),
        }
    }
}

impl ApiServerConfig {
    pub fn from_bot_config(config: &BotConfig) -> Result<Self> {
        Ok(Self {
            addr: config.api_socket_addr()?,
            name: format!("{}bot Mini Stats API", config.meme),
        })
    }
}

#[derive(Clone)]
struct AppState {
    storage: Arc<dyn StorageBackend>,
    name: String,
}

/// `GET /` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub name: String,
    pub version: String,
    pub mutation_count: i64,
    pub total_servers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Read-only stats server
pub struct ApiServer {
    config: ApiServerConfig,
    storage: Arc<dyn StorageBackend>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self { config, storage }
    }

    /// Router with all routes and middleware, without binding a socket
    pub fn router(&self) -> Router {
        Self::build_router(AppState {
            storage: self.storage.clone(),
            name: self.config.name.clone(),
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(stats_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("Stats API listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Stats API stopped");
        Ok(())
    }
}

async fn stats_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Stats requested");
    match state.storage.global_stats().await {
        Ok(stats) => Ok(Json(StatsResponse {
            name: state.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            mutation_count: stats.mutation_count,
            total_servers: stats.total_servers,
        })),
        Err(e) => {
            error!("Failed to read stats: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "stats unavailable".to_string(),
                }),
            ))
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
