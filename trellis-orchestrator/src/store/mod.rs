//! Storage layer
//!
//! Stores abstract the durable backing state of the orchestrator behind
//! focused, trait-based interfaces so the service layer can run against
//! Postgres in production and an in-memory implementation in tests and
//! local development.
//!
//! Conditional transitions (`record_started`, `transition`) are store
//! primitives: they claim a status change and report whether the claim won,
//! which is what keeps concurrent duplicate lifecycle calls safe.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgConfigStore, PgInstanceStore};

use async_trait::async_trait;
use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::{InstanceStatus, PipelineInstance, PipelineJobInfo};
use uuid::Uuid;

/// Storage error type
#[derive(Debug)]
pub enum StoreError {
    /// Another instance already holds this number for the configuration.
    /// Transient under concurrent creation; the numbering service absorbs
    /// it by re-reading the current maximum and retrying.
    DuplicateNumber {
        pipeline_config_id: Uuid,
        number: i32,
    },
    /// A persisted status string no longer parses. Surfaced instead of
    /// guessing a state: a misread status could make a finished instance
    /// look startable again.
    CorruptStatus { id: Uuid, status: String },
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Store for pipeline configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn insert(&self, config: &PipelineConfig) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineConfig>, StoreError>;

    async fn list_all(&self) -> Result<Vec<PipelineConfig>, StoreError>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Store for pipeline instances
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Inserts a new instance. Fails with [`StoreError::DuplicateNumber`]
    /// when the `(pipeline_config_id, number)` pair is already taken; the
    /// check and the insert are atomic with respect to concurrent inserts.
    async fn insert(&self, instance: &PipelineInstance) -> Result<(), StoreError>;

    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<PipelineInstance>, StoreError>;

    async fn find_by_config_and_id(
        &self,
        config_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PipelineInstance>, StoreError>;

    /// Highest number currently assigned under the configuration, if any.
    async fn max_number(&self, config_id: Uuid) -> Result<Option<i32>, StoreError>;

    async fn count_by_config(&self, config_id: Uuid) -> Result<u64, StoreError>;

    /// Claims the `Created -> Running` transition and records the run's
    /// bookkeeping in one atomic step. Returns false when the instance was
    /// no longer in `Created`, i.e. a concurrent start already won.
    async fn record_started(
        &self,
        id: Uuid,
        job_info: &PipelineJobInfo,
    ) -> Result<bool, StoreError>;

    /// Compare-and-set status change. Returns false when the current status
    /// was not one of `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: &[InstanceStatus],
        to: InstanceStatus,
    ) -> Result<bool, StoreError>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
