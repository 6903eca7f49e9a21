//! Pipeline configuration domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline configuration
///
/// A reusable, named template binding a processing job definition to one
/// source-control project. Owns zero or more pipeline instances; it is the
/// sole source of the "create next instance" operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: Uuid,
    /// Internal id of the data project this configuration belongs to.
    pub data_project_id: Uuid,
    /// Opaque handle to the project on the external CI/VCS provider.
    pub project_handle: String,
    pub name: String,
    /// Prefix for per-instance branch names, e.g. "data-pipeline/cats-vs-dogs".
    pub branch_prefix: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PipelineConfig {
    /// Branch name an instance with the given number executes against.
    ///
    /// Fixed at instance creation; lifecycle transitions never change it.
    pub fn branch_for_number(&self, number: i32) -> String {
        format!("{}-{}", self.branch_prefix, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_for_number() {
        let config = PipelineConfig {
            id: Uuid::new_v4(),
            data_project_id: Uuid::new_v4(),
            project_handle: "42".to_string(),
            name: "Cats vs Dogs".to_string(),
            branch_prefix: "data-pipeline/cats-vs-dogs".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        assert_eq!(config.branch_for_number(3), "data-pipeline/cats-vs-dogs-3");
    }
}
