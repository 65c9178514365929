//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload and scene indexing backed by a disk cache
//! - Natural-language scene queries over stored indexes
//! - Best-effort mail delivery of new indexes
//! - Security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{IndexOutcome, MailConfig, Notifier, QueryAnswerer, SceneIndexer};
pub use state::AppState;
