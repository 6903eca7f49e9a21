//! External provider layer
//!
//! Providers abstract the external CI engine and source-control host behind
//! trait-based interfaces. The orchestrator only ever talks to these traits;
//! the GitLab-style HTTP implementation lives in [`gitlab`], and the test
//! suite substitutes recording mocks.

pub mod gitlab;

#[cfg(test)]
pub mod mock;

pub use gitlab::GitLabProvider;

use async_trait::async_trait;

/// Provider error type
#[derive(Debug)]
pub enum ProviderError {
    /// The provider could not be reached or timed out.
    Unavailable(String),
    /// The provider answered with a non-success status.
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Unavailable(err.to_string())
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unavailable(msg) => write!(f, "provider unreachable: {}", msg),
            ProviderError::Rejected { status, message } => {
                write!(f, "provider rejected the request (status {}): {}", status, message)
            }
        }
    }
}

/// External CI engine executing rendered job-definition documents
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// Submits a job-definition document for execution against a branch.
    ///
    /// # Returns
    /// The provider's opaque run identifier.
    async fn trigger_run(
        &self,
        project_handle: &str,
        access_token: &str,
        target_branch: &str,
        definition: &str,
    ) -> Result<String, ProviderError>;

    /// Requests that the provider halt a run previously created by
    /// [`trigger_run`](Self::trigger_run).
    async fn cancel_run(
        &self,
        project_handle: &str,
        access_token: &str,
        external_run_id: &str,
    ) -> Result<(), ProviderError>;
}

/// Source-control host owning the per-instance branches
#[async_trait]
pub trait VcsProvider: Send + Sync {
    /// Deletes an instance's target branch so no orphaned branch remains.
    async fn delete_branch(
        &self,
        project_handle: &str,
        access_token: &str,
        branch: &str,
    ) -> Result<(), ProviderError>;
}
