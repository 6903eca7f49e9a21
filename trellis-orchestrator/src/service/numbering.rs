//! Instance numbering
//!
//! Assigns unique, monotonically increasing sequence numbers to instances
//! within a configuration. The claim is read-max plus insert, where the
//! insert is rejected atomically by the store when the number was taken in
//! the meantime; the conflict is absorbed here by re-reading and retrying,
//! so it is never visible to callers. Numbers are permanent identifiers:
//! deleting an instance leaves a gap, it never renumbers survivors.

use std::sync::Arc;
use trellis_core::domain::instance::PipelineInstance;
use uuid::Uuid;

use crate::service::{OrchestratorError, Result};
use crate::store::{InstanceStore, StoreError};

/// Attempts before a creation fails closed. Each retry re-reads the current
/// maximum, so exhaustion requires this many competing creations to win
/// against us back to back.
const CLAIM_ATTEMPTS: u32 = 16;

/// Claims instance numbers under a configuration
pub struct InstanceNumberer {
    instances: Arc<dyn InstanceStore>,
}

impl InstanceNumberer {
    pub fn new(instances: Arc<dyn InstanceStore>) -> Self {
        Self { instances }
    }

    /// Claims the next free number and persists the instance built for it.
    ///
    /// `build` constructs the candidate instance for a given number (the
    /// number also determines the target branch, so the instance cannot be
    /// built up front).
    pub async fn claim<F>(&self, config_id: Uuid, build: F) -> Result<PipelineInstance>
    where
        F: Fn(i32) -> PipelineInstance,
    {
        let mut last_conflict = None;

        for attempt in 1..=CLAIM_ATTEMPTS {
            let next = self
                .instances
                .max_number(config_id)
                .await?
                .map_or(1, |max| max + 1);

            let candidate = build(next);

            match self.instances.insert(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(conflict @ StoreError::DuplicateNumber { .. }) => {
                    tracing::debug!(
                        "Number {} for config {} claimed concurrently (attempt {}), retrying",
                        next,
                        config_id,
                        attempt
                    );
                    last_conflict = Some(conflict);
                }
                Err(err) => return Err(err.into()),
            }
        }

        // Fail closed rather than risk a collision; reaching this means the
        // store lost CLAIM_ATTEMPTS races in a row.
        tracing::error!(
            "Exhausted {} numbering attempts for config {}",
            CLAIM_ATTEMPTS,
            config_id
        );
        Err(OrchestratorError::Storage(last_conflict.expect(
            "claim loop always records a conflict before exhausting",
        )))
    }
}
