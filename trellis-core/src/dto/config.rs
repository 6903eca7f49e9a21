//! Pipeline configuration DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::config::PipelineConfig;
use crate::domain::instance::PipelineInstance;
use crate::dto::instance::PipelineInstanceDto;

/// Request to create a new pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipelineConfig {
    pub name: String,
    pub data_project_id: Uuid,
    pub project_handle: String,
    pub branch_prefix: String,
}

/// Pipeline configuration with its instances, as served by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfigDto {
    pub id: Uuid,
    pub data_project_id: Uuid,
    pub project_handle: String,
    pub name: String,
    pub branch_prefix: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub instances: Vec<PipelineInstanceDto>,
}

impl PipelineConfigDto {
    pub fn from_domain(config: PipelineConfig, instances: Vec<PipelineInstance>) -> Self {
        Self {
            id: config.id,
            data_project_id: config.data_project_id,
            project_handle: config.project_handle,
            name: config.name,
            branch_prefix: config.branch_prefix,
            created_at: config.created_at,
            updated_at: config.updated_at,
            instances: instances.into_iter().map(PipelineInstanceDto::from).collect(),
        }
    }
}
