//! Recording provider mocks for tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::provider::{CiProvider, ProviderError, VcsProvider};

/// A CI run captured by the mock provider
#[derive(Debug, Clone)]
pub struct TriggeredRun {
    pub project_handle: String,
    pub target_branch: String,
    pub definition: String,
}

/// Recording implementation of both provider traits
///
/// Records every call and hands out sequential run ids. Flip `available`
/// off to make every call fail the way an unreachable host would.
#[derive(Default)]
pub struct MockProvider {
    pub triggered: Mutex<Vec<TriggeredRun>>,
    pub canceled: Mutex<Vec<String>>,
    pub deleted_branches: Mutex<Vec<String>>,
    available: AtomicBool,
    next_run_id: AtomicU64,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            next_run_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::Unavailable(
                "connection refused".to_string(),
            ))
        }
    }
}

#[async_trait]
impl CiProvider for MockProvider {
    async fn trigger_run(
        &self,
        project_handle: &str,
        _access_token: &str,
        target_branch: &str,
        definition: &str,
    ) -> Result<String, ProviderError> {
        self.check_available()?;

        self.triggered.lock().unwrap().push(TriggeredRun {
            project_handle: project_handle.to_string(),
            target_branch: target_branch.to_string(),
            definition: definition.to_string(),
        });

        Ok(self.next_run_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn cancel_run(
        &self,
        _project_handle: &str,
        _access_token: &str,
        external_run_id: &str,
    ) -> Result<(), ProviderError> {
        self.check_available()?;
        self.canceled.lock().unwrap().push(external_run_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl VcsProvider for MockProvider {
    async fn delete_branch(
        &self,
        _project_handle: &str,
        _access_token: &str,
        branch: &str,
    ) -> Result<(), ProviderError> {
        self.check_available()?;
        self.deleted_branches.lock().unwrap().push(branch.to_string());
        Ok(())
    }
}
