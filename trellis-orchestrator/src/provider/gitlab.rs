//! GitLab-style HTTP provider
//!
//! Implements both provider traits against a GitLab-compatible REST API:
//! - Triggering and canceling CI pipelines
//! - Deleting repository branches
//!
//! Every request carries the caller's access token and is bounded by the
//! client-wide timeout configured at construction.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::provider::{CiProvider, ProviderError, VcsProvider};

/// HTTP client for a GitLab-compatible CI/VCS host
#[derive(Debug, Clone)]
pub struct GitLabProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRun {
    id: i64,
}

impl GitLabProvider {
    /// Creates a new provider client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the host (e.g. "https://gitlab.example.com")
    /// * `timeout` - Upper bound for any single request
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Branch names may contain slashes and must stay a single path segment.
    fn encode_segment(segment: &str) -> String {
        segment.replace('%', "%25").replace('/', "%2F")
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CiProvider for GitLabProvider {
    async fn trigger_run(
        &self,
        project_handle: &str,
        access_token: &str,
        target_branch: &str,
        definition: &str,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/api/v4/projects/{}/pipeline",
            self.base_url,
            Self::encode_segment(project_handle)
        );

        let response = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", access_token)
            .json(&serde_json::json!({
                "ref": target_branch,
                "content": definition,
            }))
            .send()
            .await?;

        let response = self.check_status(response).await?;

        let run: CreatedRun = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("invalid trigger response: {}", e)))?;

        Ok(run.id.to_string())
    }

    async fn cancel_run(
        &self,
        project_handle: &str,
        access_token: &str,
        external_run_id: &str,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/api/v4/projects/{}/pipelines/{}/cancel",
            self.base_url,
            Self::encode_segment(project_handle),
            external_run_id
        );

        let response = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", access_token)
            .send()
            .await?;

        self.check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl VcsProvider for GitLabProvider {
    async fn delete_branch(
        &self,
        project_handle: &str,
        access_token: &str,
        branch: &str,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/branches/{}",
            self.base_url,
            Self::encode_segment(project_handle),
            Self::encode_segment(branch)
        );

        let response = self
            .client
            .delete(&url)
            .header("PRIVATE-TOKEN", access_token)
            .send()
            .await?;

        self.check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_trims_trailing_slash() {
        let provider =
            GitLabProvider::new("https://gitlab.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url, "https://gitlab.example.com");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(
            GitLabProvider::encode_segment("data-pipeline/cats-1"),
            "data-pipeline%2Fcats-1"
        );
        assert_eq!(GitLabProvider::encode_segment("plain"), "plain");
    }
}
