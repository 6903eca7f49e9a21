//! Pipeline configuration API handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use trellis_core::dto::config::{CreatePipelineConfig, PipelineConfigDto};
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::orchestrator::PipelineOrchestrator;

/// GET /api/v1/pipelines
/// List all pipeline configurations with their instances
pub async fn list_configs(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
) -> ApiResult<Json<Vec<PipelineConfigDto>>> {
    tracing::debug!("Listing all pipeline configs");

    let configs = orchestrator.list_configs().await?;

    Ok(Json(
        configs
            .into_iter()
            .map(|(config, instances)| PipelineConfigDto::from_domain(config, instances))
            .collect(),
    ))
}

/// POST /api/v1/pipelines
/// Create a new pipeline configuration
pub async fn create_config(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Json(req): Json<CreatePipelineConfig>,
) -> ApiResult<Json<PipelineConfigDto>> {
    tracing::info!("Creating pipeline config: {}", req.name);

    let config = orchestrator.create_config(req).await?;

    Ok(Json(PipelineConfigDto::from_domain(config, Vec::new())))
}

/// GET /api/v1/pipelines/{id}
/// Get one pipeline configuration with its instances
pub async fn get_config(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineConfigDto>> {
    tracing::debug!("Getting pipeline config: {}", id);

    let (config, instances) = orchestrator.get_config(id).await?;

    Ok(Json(PipelineConfigDto::from_domain(config, instances)))
}

/// DELETE /api/v1/pipelines/{id}
/// Delete a pipeline configuration (refused while instances remain)
pub async fn delete_config(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline config: {}", id);

    orchestrator.delete_config(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
