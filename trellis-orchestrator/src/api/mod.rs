//! API Module
//!
//! HTTP API layer for the orchestrator. Handlers stay thin: they extract,
//! delegate to the orchestrator facade and convert errors. Authorization is
//! the gateway's job; what reaches these routes carries the already-checked
//! caller identity in headers.

pub mod auth;
pub mod error;
pub mod health;
pub mod instance;
pub mod pipeline;

use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::orchestrator::PipelineOrchestrator;

/// Create the main API router with all endpoints
pub fn create_router(orchestrator: Arc<PipelineOrchestrator>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Configuration endpoints
        .route(
            "/api/v1/pipelines",
            get(pipeline::list_configs).post(pipeline::create_config),
        )
        .route(
            "/api/v1/pipelines/{id}",
            get(pipeline::get_config).delete(pipeline::delete_config),
        )
        // Instance endpoints
        .route(
            "/api/v1/pipelines/{pid}/instances",
            get(instance::list_instances).post(instance::create_instance),
        )
        .route(
            "/api/v1/pipelines/{pid}/instances/{id}",
            get(instance::get_instance).delete(instance::delete_instance),
        )
        .route(
            "/api/v1/pipelines/{pid}/instances/{id}/definition",
            get(instance::get_definition),
        )
        // Static segments (definition, status) win over the action wildcard
        .route(
            "/api/v1/pipelines/{pid}/instances/{id}/status",
            put(instance::report_status),
        )
        .route(
            "/api/v1/pipelines/{pid}/instances/{id}/{action}",
            put(instance::dispatch_action),
        )
        // Add state and middleware
        .with_state(orchestrator)
        .layer(TraceLayer::new_for_http())
}
