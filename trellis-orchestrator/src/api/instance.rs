//! Pipeline instance API handlers
//!
//! Instance operations are always config-scoped: the orchestrator resolves
//! the configuration first, so a bad config id is a 404 before instances
//! are even considered.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use trellis_core::dto::instance::{PipelineInstanceDto, ReportStatusRequest};
use uuid::Uuid;

use crate::api::auth::Caller;
use crate::api::error::{ApiError, ApiResult};
use crate::service::orchestrator::PipelineOrchestrator;

const SECRET_HEADER: &str = "x-pipeline-secret";

/// GET /api/v1/pipelines/{pid}/instances
/// List instances under a configuration
pub async fn list_instances(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path(pid): Path<Uuid>,
) -> ApiResult<Json<Vec<PipelineInstanceDto>>> {
    tracing::debug!("Listing instances for config {}", pid);

    let instances = orchestrator.list_instances(pid).await?;

    Ok(Json(
        instances.into_iter().map(PipelineInstanceDto::from).collect(),
    ))
}

/// GET /api/v1/pipelines/{pid}/instances/{id}
/// Get one instance under a configuration
pub async fn get_instance(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path((pid, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<PipelineInstanceDto>> {
    let instance = orchestrator.get_instance(pid, id).await?;

    Ok(Json(PipelineInstanceDto::from(instance)))
}

/// POST /api/v1/pipelines/{pid}/instances
/// Create the next numbered instance for a configuration
pub async fn create_instance(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path(pid): Path<Uuid>,
) -> ApiResult<Json<PipelineInstanceDto>> {
    tracing::info!("Creating instance for config {}", pid);

    let instance = orchestrator.create_instance(pid).await?;

    Ok(Json(PipelineInstanceDto::from(instance)))
}

/// PUT /api/v1/pipelines/{pid}/instances/{id}/{action}
/// Dispatch a lifecycle action (start, archive, cancel)
pub async fn dispatch_action(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path((pid, id, action)): Path<(Uuid, Uuid, String)>,
    caller: Caller,
) -> ApiResult<Json<PipelineInstanceDto>> {
    tracing::info!("Dispatching '{}' on instance {} of config {}", action, id, pid);

    let instance = orchestrator
        .dispatch(pid, id, &action, &caller.username, &caller.access_token)
        .await?;

    Ok(Json(PipelineInstanceDto::from(instance)))
}

/// GET /api/v1/pipelines/{pid}/instances/{id}/definition
/// Render the job-definition document for an instance (text/plain)
pub async fn get_definition(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path((pid, id)): Path<(Uuid, Uuid)>,
    caller: Caller,
) -> ApiResult<String> {
    let document = orchestrator
        .render_definition(pid, id, &caller.username)
        .await?;

    Ok(document)
}

/// PUT /api/v1/pipelines/{pid}/instances/{id}/status
/// Status callback from the running job, authorized by the instance secret
pub async fn report_status(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path((pid, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<ReportStatusRequest>,
) -> ApiResult<Json<PipelineInstanceDto>> {
    let secret = headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Pipeline-Secret header".to_string()))?;

    let instance = orchestrator
        .report_status(pid, id, secret, req.status)
        .await?;

    Ok(Json(PipelineInstanceDto::from(instance)))
}

/// DELETE /api/v1/pipelines/{pid}/instances/{id}
/// Delete a non-running instance and its branch
pub async fn delete_instance(
    State(orchestrator): State<Arc<PipelineOrchestrator>>,
    Path((pid, id)): Path<(Uuid, Uuid)>,
    caller: Caller,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting instance {} of config {}", id, pid);

    orchestrator
        .delete_instance(pid, id, &caller.access_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
