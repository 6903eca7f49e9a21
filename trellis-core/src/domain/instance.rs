//! Pipeline instance domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One numbered, stateful run of a pipeline configuration
///
/// Structure shared between the orchestrator (persists) and the boundary
/// layer (renders). `number` is unique and strictly increasing within the
/// owning configuration; it is a permanent identifier once assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInstance {
    pub id: Uuid,
    pub pipeline_config_id: Uuid,
    pub number: i32,
    /// Source-control branch the CI run executes against. Fixed at creation.
    pub target_branch: String,
    pub status: InstanceStatus,
    /// Present iff the instance has progressed beyond `Created`.
    pub job_info: Option<PipelineJobInfo>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Instance lifecycle status
///
/// `Created → Running → {Succeeded, Failed, Canceled, Archived}`.
/// `Succeeded`, `Failed` and `Canceled` are reported by the CI provider;
/// `Archived` is a local bookkeeping transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Created,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Archived,
}

impl InstanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Created => "created",
            InstanceStatus::Running => "running",
            InstanceStatus::Succeeded => "succeeded",
            InstanceStatus::Failed => "failed",
            InstanceStatus::Canceled => "canceled",
            InstanceStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(InstanceStatus::Created),
            "running" => Some(InstanceStatus::Running),
            "succeeded" => Some(InstanceStatus::Succeeded),
            "failed" => Some(InstanceStatus::Failed),
            "canceled" => Some(InstanceStatus::Canceled),
            "archived" => Some(InstanceStatus::Archived),
            _ => None,
        }
    }

    /// No further lifecycle transitions are possible from these states
    /// (deletion is orthogonal and stays available).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InstanceStatus::Succeeded
                | InstanceStatus::Failed
                | InstanceStatus::Canceled
                | InstanceStatus::Archived
        )
    }

    /// Archiving is valid from `Running` or any provider-reported terminal
    /// state. A `Created` instance has nothing to archive.
    pub fn can_archive(self) -> bool {
        matches!(
            self,
            InstanceStatus::Running
                | InstanceStatus::Succeeded
                | InstanceStatus::Failed
                | InstanceStatus::Canceled
        )
    }
}

/// CI run bookkeeping attached to a started instance
///
/// `secret` authorizes status callbacks from the running job and is
/// write-once: it is generated at start time and never regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJobInfo {
    /// Opaque handle to the run on the external CI provider.
    pub external_run_id: String,
    pub secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            InstanceStatus::Created,
            InstanceStatus::Running,
            InstanceStatus::Succeeded,
            InstanceStatus::Failed,
            InstanceStatus::Canceled,
            InstanceStatus::Archived,
        ] {
            assert_eq!(InstanceStatus::parse(status.as_str()), Some(status));
        }

        assert_eq!(InstanceStatus::parse("paused"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!InstanceStatus::Created.is_terminal());
        assert!(!InstanceStatus::Running.is_terminal());
        assert!(InstanceStatus::Succeeded.is_terminal());
        assert!(InstanceStatus::Archived.is_terminal());
    }

    #[test]
    fn test_archivable_states() {
        assert!(!InstanceStatus::Created.can_archive());
        assert!(!InstanceStatus::Archived.can_archive());
        assert!(InstanceStatus::Running.can_archive());
        assert!(InstanceStatus::Canceled.can_archive());
    }
}
