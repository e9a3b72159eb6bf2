//! HTTP API exposing aggregate bot stats
//!
//! Provides:
//! - `GET /` global mutation count and server count
//! - `GET /health` liveness check

pub mod server;

pub use server::{ApiServer, ApiServerConfig, HealthResponse, StatsResponse};
