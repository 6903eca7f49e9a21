//! Job-definition document rendering
//!
//! Produces the textual artifact the CI provider consumes to execute an
//! instance. Rendering is pure: it never touches instance state, and it
//! works for instances that have not started yet (the secret slot then
//! carries the redacted placeholder), so a preview never forces a start.

use trellis_core::domain::config::PipelineConfig;
use trellis_core::domain::instance::PipelineInstance;

/// Renders the job-definition document for an instance.
///
/// Embeds the target branch, the configuration and instance identity, the
/// requesting actor (for audit attribution) and the secret slot handed in
/// by the caller, either the real secret or the redacted placeholder.
pub fn render(
    config: &PipelineConfig,
    instance: &PipelineInstance,
    actor: &str,
    secret: &str,
) -> String {
    format!(
        r#"# Job definition for "{name}" instance #{number}
# Generated by the Trellis orchestrator, do not edit.
# Requested by: {actor}

variables:
  TRELLIS_CONFIG_ID: "{config_id}"
  TRELLIS_INSTANCE_ID: "{instance_id}"
  TRELLIS_INSTANCE_NUMBER: "{number}"
  TRELLIS_TARGET_BRANCH: "{branch}"
  TRELLIS_PIPELINE_SECRET: "{secret}"

run-pipeline:
  script:
    - trellis-runner execute --instance "$TRELLIS_INSTANCE_ID" --secret "$TRELLIS_PIPELINE_SECRET"
  only:
    - {branch}
"#,
        name = config.name,
        actor = actor,
        config_id = config.id,
        instance_id = instance.id,
        number = instance.number,
        branch = instance.target_branch,
        secret = secret,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trellis_core::domain::instance::InstanceStatus;
    use uuid::Uuid;

    use crate::service::secret::{REDACTED_PLACEHOLDER, SecretManager};

    fn fixtures() -> (PipelineConfig, PipelineInstance) {
        let config = PipelineConfig {
            id: Uuid::new_v4(),
            data_project_id: Uuid::new_v4(),
            project_handle: "314".to_string(),
            name: "Cats vs Dogs".to_string(),
            branch_prefix: "data-pipeline/cats-vs-dogs".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let instance = PipelineInstance {
            id: Uuid::new_v4(),
            pipeline_config_id: config.id,
            number: 2,
            target_branch: config.branch_for_number(2),
            status: InstanceStatus::Created,
            job_info: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (config, instance)
    }

    #[test]
    fn test_render_embeds_branch_actor_and_identity() {
        let (config, instance) = fixtures();
        let document = render(&config, &instance, "mira", "sometoken");

        assert!(document.contains("data-pipeline/cats-vs-dogs-2"));
        assert!(document.contains("Requested by: mira"));
        assert!(document.contains(&instance.id.to_string()));
        assert!(document.contains(r#"TRELLIS_INSTANCE_NUMBER: "2""#));
    }

    #[test]
    fn test_render_with_redacted_secret() {
        let (config, instance) = fixtures();
        let document = render(&config, &instance, "mira", SecretManager::redact(None));

        // Never an empty slot in place of a missing secret
        assert!(document.contains(&format!(
            r#"TRELLIS_PIPELINE_SECRET: "{}""#,
            REDACTED_PLACEHOLDER
        )));
        assert!(!document.contains(r#"TRELLIS_PIPELINE_SECRET: """#));
    }

    #[test]
    fn test_render_with_real_secret() {
        let (config, instance) = fixtures();
        let document = render(&config, &instance, "mira", "s3cr3t-token");

        assert!(document.contains(r#"TRELLIS_PIPELINE_SECRET: "s3cr3t-token""#));
        assert!(!document.contains(REDACTED_PLACEHOLDER));
    }
}
