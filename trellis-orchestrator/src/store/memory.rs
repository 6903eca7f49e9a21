//! In-memory store
//!
//! Mutex-guarded maps with the same atomicity guarantees as the Postgres
//! store. Backs the test suite and local development without a database.
//! Number uniqueness is enforced inside the insert critical section, so the
//! duplicate check and the insert are a single atomic step.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::{InstanceStatus, PipelineInstance, PipelineJobInfo};
use uuid::Uuid;

use crate::store::{ConfigStore, InstanceStore, StoreError};

/// In-memory implementation of [`ConfigStore`] and [`InstanceStore`]
#[derive(Default)]
pub struct MemoryStore {
    configs: Mutex<HashMap<Uuid, PipelineConfig>>,
    instances: Mutex<HashMap<Uuid, PipelineInstance>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn insert(&self, config: &PipelineConfig) -> Result<(), StoreError> {
        self.configs.lock().await.insert(config.id, config.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineConfig>, StoreError> {
        Ok(self.configs.lock().await.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PipelineConfig>, StoreError> {
        let mut configs: Vec<PipelineConfig> = self.configs.lock().await.values().cloned().collect();
        configs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(configs)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.configs.lock().await.remove(&id).is_some())
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn insert(&self, instance: &PipelineInstance) -> Result<(), StoreError> {
        let mut instances = self.instances.lock().await;

        let taken = instances.values().any(|existing| {
            existing.pipeline_config_id == instance.pipeline_config_id
                && existing.number == instance.number
        });
        if taken {
            return Err(StoreError::DuplicateNumber {
                pipeline_config_id: instance.pipeline_config_id,
                number: instance.number,
            });
        }

        instances.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<PipelineInstance>, StoreError> {
        let mut instances: Vec<PipelineInstance> = self
            .instances
            .lock()
            .await
            .values()
            .filter(|i| i.pipeline_config_id == config_id)
            .cloned()
            .collect();
        instances.sort_by_key(|i| i.number);
        Ok(instances)
    }

    async fn find_by_config_and_id(
        &self,
        config_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PipelineInstance>, StoreError> {
        Ok(self
            .instances
            .lock()
            .await
            .get(&id)
            .filter(|i| i.pipeline_config_id == config_id)
            .cloned())
    }

    async fn max_number(&self, config_id: Uuid) -> Result<Option<i32>, StoreError> {
        Ok(self
            .instances
            .lock()
            .await
            .values()
            .filter(|i| i.pipeline_config_id == config_id)
            .map(|i| i.number)
            .max())
    }

    async fn count_by_config(&self, config_id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .instances
            .lock()
            .await
            .values()
            .filter(|i| i.pipeline_config_id == config_id)
            .count() as u64)
    }

    async fn record_started(
        &self,
        id: Uuid,
        job_info: &PipelineJobInfo,
    ) -> Result<bool, StoreError> {
        let mut instances = self.instances.lock().await;

        match instances.get_mut(&id) {
            Some(instance) if instance.status == InstanceStatus::Created => {
                instance.status = InstanceStatus::Running;
                instance.job_info = Some(job_info.clone());
                instance.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[InstanceStatus],
        to: InstanceStatus,
    ) -> Result<bool, StoreError> {
        let mut instances = self.instances.lock().await;

        match instances.get_mut(&id) {
            Some(instance) if from.contains(&instance.status) => {
                instance.status = to;
                instance.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.instances.lock().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(config_id: Uuid, number: i32) -> PipelineInstance {
        PipelineInstance {
            id: Uuid::new_v4(),
            pipeline_config_id: config_id,
            number,
            target_branch: format!("data-pipeline/test-{}", number),
            status: InstanceStatus::Created,
            job_info: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_number() {
        let store = MemoryStore::new();
        let config_id = Uuid::new_v4();

        InstanceStore::insert(&store, &instance(config_id, 1))
            .await
            .unwrap();

        let err = InstanceStore::insert(&store, &instance(config_id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateNumber { number: 1, .. }));

        // Same number under a different configuration is fine
        InstanceStore::insert(&store, &instance(Uuid::new_v4(), 1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_started_claims_once() {
        let store = MemoryStore::new();
        let config_id = Uuid::new_v4();
        let created = instance(config_id, 1);
        InstanceStore::insert(&store, &created).await.unwrap();

        let job_info = PipelineJobInfo {
            external_run_id: "17".to_string(),
            secret: "token".to_string(),
        };

        assert!(store.record_started(created.id, &job_info).await.unwrap());
        // Second claim loses: no longer in Created
        assert!(!store.record_started(created.id, &job_info).await.unwrap());

        let stored = store
            .find_by_config_and_id(config_id, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InstanceStatus::Running);
        assert_eq!(stored.job_info.unwrap().external_run_id, "17");
    }

    #[tokio::test]
    async fn test_transition_compare_and_set() {
        let store = MemoryStore::new();
        let config_id = Uuid::new_v4();
        let created = instance(config_id, 1);
        InstanceStore::insert(&store, &created).await.unwrap();

        // Created is not in the from-set
        let moved = store
            .transition(
                created.id,
                &[InstanceStatus::Running],
                InstanceStatus::Canceled,
            )
            .await
            .unwrap();
        assert!(!moved);

        let stored = store
            .find_by_config_and_id(config_id, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InstanceStatus::Created);
    }
}
