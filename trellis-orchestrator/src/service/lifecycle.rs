//! Instance lifecycle engine
//!
//! Drives an instance through `Created -> Running -> terminal` and handles
//! the irreversible external side effects on the way: triggering and
//! canceling CI runs, and deleting the instance branch before the record
//! goes away. Every transition is claimed through a store compare-and-set,
//! so of two concurrent duplicate calls exactly one wins and the other
//! observes `InvalidTransition`.

use std::sync::Arc;
use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::{
    InstanceStatus, PipelineInstance, PipelineJobInfo,
};
use trellis_core::dto::instance::ReportedStatus;

use crate::provider::{CiProvider, VcsProvider};
use crate::service::secret::SecretManager;
use crate::service::{OrchestratorError, Result, artifact};
use crate::store::InstanceStore;

/// State machine over a single instance
pub struct LifecycleEngine {
    instances: Arc<dyn InstanceStore>,
    ci: Arc<dyn CiProvider>,
    vcs: Arc<dyn VcsProvider>,
    secrets: SecretManager,
}

impl LifecycleEngine {
    pub fn new(
        instances: Arc<dyn InstanceStore>,
        ci: Arc<dyn CiProvider>,
        vcs: Arc<dyn VcsProvider>,
    ) -> Self {
        Self {
            instances,
            ci,
            vcs,
            secrets: SecretManager::new(),
        }
    }

    /// Starts a `Created` instance: issues its secret, renders the
    /// job-definition document, submits it to the CI provider and records
    /// the returned run id.
    ///
    /// The provider call happens before any state mutation, so a provider
    /// failure leaves the instance untouched and the operation is
    /// all-or-nothing from the caller's perspective.
    pub async fn start(
        &self,
        config: &PipelineConfig,
        instance: PipelineInstance,
        actor: &str,
        access_token: &str,
    ) -> Result<PipelineInstance> {
        if instance.status != InstanceStatus::Created {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Cannot start instance {} in status '{}'",
                instance.id,
                instance.status.as_str()
            )));
        }

        let secret = self.secrets.issue();
        let definition = artifact::render(config, &instance, actor, &secret);

        let external_run_id = self
            .ci
            .trigger_run(
                &config.project_handle,
                access_token,
                &instance.target_branch,
                &definition,
            )
            .await?;

        let job_info = PipelineJobInfo {
            external_run_id,
            secret,
        };

        let claimed = self.instances.record_started(instance.id, &job_info).await?;
        if !claimed {
            // A concurrent start won between our status check and the claim.
            // The run we just created has no owner; ask the provider to halt
            // it, best effort.
            tracing::warn!(
                "Instance {} was started concurrently, canceling orphaned run {}",
                instance.id,
                job_info.external_run_id
            );
            if let Err(err) = self
                .ci
                .cancel_run(
                    &config.project_handle,
                    access_token,
                    &job_info.external_run_id,
                )
                .await
            {
                tracing::warn!(
                    "Failed to cancel orphaned run {}: {}",
                    job_info.external_run_id,
                    err
                );
            }

            return Err(OrchestratorError::InvalidTransition(format!(
                "Instance {} is no longer in status 'created'",
                instance.id
            )));
        }

        tracing::info!(
            "Instance {} (#{}) started as run {} on branch {}",
            instance.id,
            instance.number,
            job_info.external_run_id,
            instance.target_branch
        );

        self.reload(&instance).await
    }

    /// Marks a running or finished instance as archived. Local bookkeeping
    /// only; the CI provider is not contacted.
    pub async fn archive(&self, instance: PipelineInstance) -> Result<PipelineInstance> {
        if !instance.status.can_archive() {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Cannot archive instance {} in status '{}'",
                instance.id,
                instance.status.as_str()
            )));
        }

        let archivable = [
            InstanceStatus::Running,
            InstanceStatus::Succeeded,
            InstanceStatus::Failed,
            InstanceStatus::Canceled,
        ];
        let moved = self
            .instances
            .transition(instance.id, &archivable, InstanceStatus::Archived)
            .await?;
        if !moved {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Instance {} changed status concurrently and can no longer be archived",
                instance.id
            )));
        }

        tracing::info!("Instance {} archived", instance.id);
        self.reload(&instance).await
    }

    /// Asks the CI provider to halt the external run, then marks the
    /// instance canceled. Status only changes after the provider
    /// acknowledged, so a failed call leaves the instance running and the
    /// operation safe to retry.
    pub async fn cancel(
        &self,
        config: &PipelineConfig,
        instance: PipelineInstance,
        access_token: &str,
    ) -> Result<PipelineInstance> {
        if instance.status != InstanceStatus::Running {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Cannot cancel instance {} in status '{}'",
                instance.id,
                instance.status.as_str()
            )));
        }

        let job_info = instance.job_info.as_ref().ok_or_else(|| {
            OrchestratorError::InvalidTransition(format!(
                "Instance {} has no recorded run to cancel",
                instance.id
            ))
        })?;

        self.ci
            .cancel_run(
                &config.project_handle,
                access_token,
                &job_info.external_run_id,
            )
            .await?;

        let moved = self
            .instances
            .transition(
                instance.id,
                &[InstanceStatus::Running],
                InstanceStatus::Canceled,
            )
            .await?;
        if !moved {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Instance {} left status 'running' concurrently",
                instance.id
            )));
        }

        tracing::info!(
            "Instance {} canceled (run {})",
            instance.id,
            job_info.external_run_id
        );
        self.reload(&instance).await
    }

    /// Deletes a non-running instance. The target branch is cleaned up on
    /// the source-control provider first; if that fails the record stays,
    /// so no orphaned branch can outlive its instance.
    pub async fn delete(
        &self,
        config: &PipelineConfig,
        instance: PipelineInstance,
        access_token: &str,
    ) -> Result<()> {
        if instance.status == InstanceStatus::Running {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Cannot delete instance {} while it is running, cancel it first",
                instance.id
            )));
        }

        self.vcs
            .delete_branch(
                &config.project_handle,
                access_token,
                &instance.target_branch,
            )
            .await?;

        self.instances.delete(instance.id).await?;

        tracing::info!(
            "Instance {} deleted along with branch {}",
            instance.id,
            instance.target_branch
        );
        Ok(())
    }

    /// Applies a terminal status reported by the running job itself,
    /// authorized by the per-instance secret.
    pub async fn report(
        &self,
        instance: PipelineInstance,
        presented_secret: &str,
        reported: ReportedStatus,
    ) -> Result<PipelineInstance> {
        let job_info = instance
            .job_info
            .as_ref()
            .ok_or(OrchestratorError::InvalidSecret)?;

        if !SecretManager::verify(&job_info.secret, presented_secret) {
            return Err(OrchestratorError::InvalidSecret);
        }

        // CI jobs retry their callback; a duplicate report must not flip an
        // instance that already finished.
        if instance.status.is_terminal() {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Instance {} already finished as '{}'",
                instance.id,
                instance.status.as_str()
            )));
        }

        let to = InstanceStatus::from(reported);
        let moved = self
            .instances
            .transition(instance.id, &[InstanceStatus::Running], to)
            .await?;
        if !moved {
            return Err(OrchestratorError::InvalidTransition(format!(
                "Instance {} is not running, refusing reported status '{}'",
                instance.id,
                to.as_str()
            )));
        }

        tracing::info!(
            "Instance {} reported terminal status '{}'",
            instance.id,
            to.as_str()
        );
        self.reload(&instance).await
    }

    async fn reload(&self, instance: &PipelineInstance) -> Result<PipelineInstance> {
        self.instances
            .find_by_config_and_id(instance.pipeline_config_id, instance.id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound("PipelineInstance was not found".to_string())
            })
    }
}
