//! Pipeline instance DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::instance::{InstanceStatus, PipelineInstance};

/// Pipeline instance as served by the API
///
/// The secret never leaves the orchestrator through this type; only the
/// external run id is exposed once a run exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInstanceDto {
    pub id: Uuid,
    pub pipeline_config_id: Uuid,
    pub number: i32,
    pub target_branch: String,
    pub status: InstanceStatus,
    pub external_run_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PipelineInstance> for PipelineInstanceDto {
    fn from(instance: PipelineInstance) -> Self {
        Self {
            id: instance.id,
            pipeline_config_id: instance.pipeline_config_id,
            number: instance.number,
            target_branch: instance.target_branch,
            status: instance.status,
            external_run_id: instance.job_info.map(|job| job.external_run_id),
            created_at: instance.created_at,
            updated_at: instance.updated_at,
        }
    }
}

/// Lifecycle action requested through the dispatch endpoint
///
/// Closed set; anything else on the wire is a client protocol error,
/// distinct from a missing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceAction {
    Start,
    Archive,
    Cancel,
}

impl InstanceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceAction::Start => "start",
            InstanceAction::Archive => "archive",
            InstanceAction::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(InstanceAction::Start),
            "archive" => Some(InstanceAction::Archive),
            "cancel" => Some(InstanceAction::Cancel),
            _ => None,
        }
    }
}

/// Terminal status reported back by the running job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedStatus {
    Succeeded,
    Failed,
    Canceled,
}

impl From<ReportedStatus> for InstanceStatus {
    fn from(reported: ReportedStatus) -> Self {
        match reported {
            ReportedStatus::Succeeded => InstanceStatus::Succeeded,
            ReportedStatus::Failed => InstanceStatus::Failed,
            ReportedStatus::Canceled => InstanceStatus::Canceled,
        }
    }
}

/// Body of the secret-authorized status callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusRequest {
    pub status: ReportedStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::PipelineJobInfo;

    #[test]
    fn test_action_parse() {
        assert_eq!(InstanceAction::parse("start"), Some(InstanceAction::Start));
        assert_eq!(InstanceAction::parse("archive"), Some(InstanceAction::Archive));
        assert_eq!(InstanceAction::parse("cancel"), Some(InstanceAction::Cancel));
        assert_eq!(InstanceAction::parse("publish"), None);
    }

    #[test]
    fn test_dto_hides_secret() {
        let instance = PipelineInstance {
            id: Uuid::new_v4(),
            pipeline_config_id: Uuid::new_v4(),
            number: 1,
            target_branch: "data-pipeline/test-1".to_string(),
            status: InstanceStatus::Running,
            job_info: Some(PipelineJobInfo {
                external_run_id: "8841".to_string(),
                secret: "super-secret-token".to_string(),
            }),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let dto = PipelineInstanceDto::from(instance);
        assert_eq!(dto.external_run_id.as_deref(), Some("8841"));

        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("super-secret-token"));
    }
}
