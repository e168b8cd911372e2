//! JSON/HTTP surface of the ledger engine.
//!
//! Layout:
//! - `routes.rs`: Router + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::application::engine::TransferEngine;
use crate::application::query::QueryService;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared handler state: the two application services.
pub struct AppState {
    pub engine: Arc<TransferEngine>,
    pub queries: Arc<QueryService>,
}

/// Builds the full router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(routes::router())
        .layer(Extension(Arc::new(state)))
}
