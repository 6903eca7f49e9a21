//! Pipeline orchestrator facade
//!
//! The single entry point the boundary layer uses for configuration and
//! instance operations. Every config-scoped operation resolves the
//! configuration first and fails with `NotFound` before touching instances.

use chrono::Utc;
use std::sync::Arc;
use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::{InstanceStatus, PipelineInstance};
use trellis_core::dto::config::CreatePipelineConfig;
use trellis_core::dto::instance::{InstanceAction, ReportedStatus};
use uuid::Uuid;

use crate::provider::{CiProvider, VcsProvider};
use crate::service::lifecycle::LifecycleEngine;
use crate::service::numbering::InstanceNumberer;
use crate::service::secret::SecretManager;
use crate::service::{OrchestratorError, Result, artifact};
use crate::store::{ConfigStore, InstanceStore};

/// Facade composing numbering, secrets, artifact rendering and the
/// lifecycle engine
pub struct PipelineOrchestrator {
    configs: Arc<dyn ConfigStore>,
    instances: Arc<dyn InstanceStore>,
    numberer: InstanceNumberer,
    lifecycle: LifecycleEngine,
}

impl PipelineOrchestrator {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        instances: Arc<dyn InstanceStore>,
        ci: Arc<dyn CiProvider>,
        vcs: Arc<dyn VcsProvider>,
    ) -> Self {
        Self {
            numberer: InstanceNumberer::new(Arc::clone(&instances)),
            lifecycle: LifecycleEngine::new(Arc::clone(&instances), ci, vcs),
            configs,
            instances,
        }
    }

    // =========================================================================
    // Configurations
    // =========================================================================

    /// Create a new pipeline configuration
    pub async fn create_config(&self, req: CreatePipelineConfig) -> Result<PipelineConfig> {
        if req.name.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "Configuration name cannot be empty".to_string(),
            ));
        }
        if req.branch_prefix.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "Branch prefix cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let config = PipelineConfig {
            id: Uuid::new_v4(),
            data_project_id: req.data_project_id,
            project_handle: req.project_handle,
            name: req.name,
            branch_prefix: req.branch_prefix,
            created_at: now,
            updated_at: now,
        };

        self.configs.insert(&config).await?;
        tracing::info!("Pipeline config created: {} ({})", config.name, config.id);

        Ok(config)
    }

    /// List all configurations, each with its instances
    pub async fn list_configs(&self) -> Result<Vec<(PipelineConfig, Vec<PipelineInstance>)>> {
        let configs = self.configs.list_all().await?;

        let mut result = Vec::with_capacity(configs.len());
        for config in configs {
            let instances = self.instances.find_by_config(config.id).await?;
            result.push((config, instances));
        }

        Ok(result)
    }

    /// Get one configuration with its instances
    pub async fn get_config(&self, id: Uuid) -> Result<(PipelineConfig, Vec<PipelineInstance>)> {
        let config = self.resolve_config(id).await?;
        let instances = self.instances.find_by_config(config.id).await?;
        Ok((config, instances))
    }

    /// Delete a configuration
    ///
    /// Deletion does not cascade: it is refused while any instance remains,
    /// whatever state that instance is in.
    pub async fn delete_config(&self, id: Uuid) -> Result<()> {
        let config = self.resolve_config(id).await?;

        let remaining = self.instances.count_by_config(config.id).await?;
        if remaining > 0 {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Config {} still has {} instance(s), delete them first",
                config.id, remaining
            )));
        }

        self.configs.delete(config.id).await?;
        tracing::info!("Pipeline config deleted: {}", config.id);

        Ok(())
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// List instances under a configuration
    pub async fn list_instances(&self, config_id: Uuid) -> Result<Vec<PipelineInstance>> {
        let config = self.resolve_config(config_id).await?;
        Ok(self.instances.find_by_config(config.id).await?)
    }

    /// Get one instance under a configuration
    pub async fn get_instance(&self, config_id: Uuid, id: Uuid) -> Result<PipelineInstance> {
        self.resolve_config(config_id).await?;
        self.resolve_instance(config_id, id).await
    }

    /// Create the next numbered instance for a configuration
    ///
    /// The instance starts in `Created` with its target branch derived from
    /// the claimed number.
    pub async fn create_instance(&self, config_id: Uuid) -> Result<PipelineInstance> {
        let config = self.resolve_config(config_id).await?;

        let now = Utc::now();
        let instance = self
            .numberer
            .claim(config.id, |number| PipelineInstance {
                id: Uuid::new_v4(),
                pipeline_config_id: config.id,
                number,
                target_branch: config.branch_for_number(number),
                status: InstanceStatus::Created,
                job_info: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            "Instance #{} ({}) created for config {}",
            instance.number,
            instance.id,
            config.id
        );

        Ok(instance)
    }

    /// Dispatch a lifecycle action on an instance
    ///
    /// The action token comes straight from the boundary; anything outside
    /// the closed set is a protocol error, not a missing resource.
    pub async fn dispatch(
        &self,
        config_id: Uuid,
        instance_id: Uuid,
        action: &str,
        actor: &str,
        access_token: &str,
    ) -> Result<PipelineInstance> {
        let config = self.resolve_config(config_id).await?;
        let instance = self.resolve_instance(config_id, instance_id).await?;

        let action = InstanceAction::parse(action).ok_or_else(|| {
            OrchestratorError::UnsupportedAction(format!("No valid action: '{}'", action))
        })?;

        match action {
            InstanceAction::Start => {
                self.lifecycle
                    .start(&config, instance, actor, access_token)
                    .await
            }
            InstanceAction::Archive => self.lifecycle.archive(instance).await,
            InstanceAction::Cancel => {
                self.lifecycle.cancel(&config, instance, access_token).await
            }
        }
    }

    /// Render the job-definition document for an instance
    ///
    /// Works for instances that have not started: the secret slot then
    /// carries the redacted placeholder instead of a real token.
    pub async fn render_definition(
        &self,
        config_id: Uuid,
        instance_id: Uuid,
        actor: &str,
    ) -> Result<String> {
        let config = self.resolve_config(config_id).await?;
        let instance = self.resolve_instance(config_id, instance_id).await?;

        let secret = instance.job_info.as_ref().map(|job| job.secret.as_str());
        Ok(artifact::render(
            &config,
            &instance,
            actor,
            SecretManager::redact(secret),
        ))
    }

    /// Delete an instance (must not be running; its branch is cleaned up
    /// first)
    pub async fn delete_instance(
        &self,
        config_id: Uuid,
        instance_id: Uuid,
        access_token: &str,
    ) -> Result<()> {
        let config = self.resolve_config(config_id).await?;
        let instance = self.resolve_instance(config_id, instance_id).await?;

        self.lifecycle.delete(&config, instance, access_token).await
    }

    /// Apply a terminal status reported by the running job, authorized by
    /// the per-instance secret
    pub async fn report_status(
        &self,
        config_id: Uuid,
        instance_id: Uuid,
        presented_secret: &str,
        reported: ReportedStatus,
    ) -> Result<PipelineInstance> {
        self.resolve_config(config_id).await?;
        let instance = self.resolve_instance(config_id, instance_id).await?;

        self.lifecycle
            .report(instance, presented_secret, reported)
            .await
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    async fn resolve_config(&self, id: Uuid) -> Result<PipelineConfig> {
        self.configs
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound("PipelineConfig was not found".to_string()))
    }

    async fn resolve_instance(&self, config_id: Uuid, id: Uuid) -> Result<PipelineInstance> {
        self.instances
            .find_by_config_and_id(config_id, id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound("PipelineInstance was not found".to_string())
            })
    }
}
