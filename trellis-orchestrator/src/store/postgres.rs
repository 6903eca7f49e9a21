//! Postgres store implementations
//!
//! Handles all database operations for pipeline configurations and
//! instances. Instance number uniqueness is enforced by the
//! `uq_pipeline_instances_config_number` constraint; a violation is
//! reported as [`StoreError::DuplicateNumber`] so the numbering service
//! can retry.

use async_trait::async_trait;
use sqlx::PgPool;
use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::{InstanceStatus, PipelineInstance, PipelineJobInfo};
use uuid::Uuid;

use crate::store::{ConfigStore, InstanceStore, StoreError};

const NUMBER_CONSTRAINT: &str = "uq_pipeline_instances_config_number";

/// Postgres implementation of [`ConfigStore`]
#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn insert(&self, config: &PipelineConfig) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_configs (
                id, data_project_id, project_handle, name, branch_prefix,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(config.id)
        .bind(config.data_project_id)
        .bind(&config.project_handle)
        .bind(&config.name)
        .bind(&config.branch_prefix)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineConfig>, StoreError> {
        let row = sqlx::query_as::<_, ConfigRow>(
            r#"
            SELECT id, data_project_id, project_handle, name, branch_prefix,
                   created_at, updated_at
            FROM pipeline_configs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_all(&self) -> Result<Vec<PipelineConfig>, StoreError> {
        let rows = sqlx::query_as::<_, ConfigRow>(
            r#"
            SELECT id, data_project_id, project_handle, name, branch_prefix,
                   created_at, updated_at
            FROM pipeline_configs
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pipeline_configs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres implementation of [`InstanceStore`]
#[derive(Clone)]
pub struct PgInstanceStore {
    pool: PgPool,
}

impl PgInstanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstanceStore for PgInstanceStore {
    async fn insert(&self, instance: &PipelineInstance) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO pipeline_instances (
                id, pipeline_config_id, number, target_branch, status,
                external_run_id, secret, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(instance.id)
        .bind(instance.pipeline_config_id)
        .bind(instance.number)
        .bind(&instance.target_branch)
        .bind(instance.status.as_str())
        .bind(instance.job_info.as_ref().map(|j| &j.external_run_id))
        .bind(instance.job_info.as_ref().map(|j| &j.secret))
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(NUMBER_CONSTRAINT) => {
                Err(StoreError::DuplicateNumber {
                    pipeline_config_id: instance.pipeline_config_id,
                    number: instance.number,
                })
            }
            Err(err) => Err(StoreError::Database(err)),
        }
    }

    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<PipelineInstance>, StoreError> {
        let rows = sqlx::query_as::<_, InstanceRow>(
            r#"
            SELECT id, pipeline_config_id, number, target_branch, status,
                   external_run_id, secret, created_at, updated_at
            FROM pipeline_instances
            WHERE pipeline_config_id = $1
            ORDER BY number ASC
            "#,
        )
        .bind(config_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PipelineInstance::try_from).collect()
    }

    async fn find_by_config_and_id(
        &self,
        config_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PipelineInstance>, StoreError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r#"
            SELECT id, pipeline_config_id, number, target_branch, status,
                   external_run_id, secret, created_at, updated_at
            FROM pipeline_instances
            WHERE pipeline_config_id = $1 AND id = $2
            "#,
        )
        .bind(config_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineInstance::try_from).transpose()
    }

    async fn max_number(&self, config_id: Uuid) -> Result<Option<i32>, StoreError> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(number) FROM pipeline_instances WHERE pipeline_config_id = $1",
        )
        .bind(config_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn count_by_config(&self, config_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pipeline_instances WHERE pipeline_config_id = $1",
        )
        .bind(config_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn record_started(
        &self,
        id: Uuid,
        job_info: &PipelineJobInfo,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pipeline_instances
            SET status = $2, external_run_id = $3, secret = $4, updated_at = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(id)
        .bind(InstanceStatus::Running.as_str())
        .bind(&job_info.external_run_id)
        .bind(&job_info.secret)
        .bind(chrono::Utc::now())
        .bind(InstanceStatus::Created.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[InstanceStatus],
        to: InstanceStatus,
    ) -> Result<bool, StoreError> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        let result = sqlx::query(
            r#"
            UPDATE pipeline_instances
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(chrono::Utc::now())
        .bind(&from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pipeline_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ConfigRow {
    id: Uuid,
    data_project_id: Uuid,
    project_handle: String,
    name: String,
    branch_prefix: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ConfigRow> for PipelineConfig {
    fn from(row: ConfigRow) -> Self {
        PipelineConfig {
            id: row.id,
            data_project_id: row.data_project_id,
            project_handle: row.project_handle,
            name: row.name,
            branch_prefix: row.branch_prefix,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InstanceRow {
    id: Uuid,
    pipeline_config_id: Uuid,
    number: i32,
    target_branch: String,
    status: String,
    external_run_id: Option<String>,
    secret: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<InstanceRow> for PipelineInstance {
    type Error = StoreError;

    fn try_from(row: InstanceRow) -> Result<Self, StoreError> {
        let status = InstanceStatus::parse(&row.status).ok_or_else(|| {
            StoreError::CorruptStatus {
                id: row.id,
                status: row.status.clone(),
            }
        })?;

        // A row beyond Created always carries both run columns; treat a
        // partially populated pair as not started.
        let job_info = match (row.external_run_id, row.secret) {
            (Some(external_run_id), Some(secret)) => Some(PipelineJobInfo {
                external_run_id,
                secret,
            }),
            _ => None,
        };

        Ok(PipelineInstance {
            id: row.id,
            pipeline_config_id: row.pipeline_config_id,
            number: row.number,
            target_branch: row.target_branch,
            status,
            job_info,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
