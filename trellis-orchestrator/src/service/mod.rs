//! Service layer
//!
//! Business logic for the pipeline instance lifecycle. The
//! [`orchestrator::PipelineOrchestrator`] facade is the only entry point the
//! API layer uses; the remaining modules are its collaborators:
//! - [`secret`]: per-instance callback token issuing and redaction
//! - [`numbering`]: race-free instance sequence numbers
//! - [`artifact`]: job-definition document rendering
//! - [`lifecycle`]: the start/archive/cancel/delete state machine

pub mod artifact;
pub mod lifecycle;
pub mod numbering;
pub mod orchestrator;
pub mod secret;

use crate::provider::ProviderError;
use crate::store::StoreError;

/// Service error type
///
/// Every variant maps to a stable machine-readable code; the API layer
/// attaches the HTTP status.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Config or instance absent. Terminal client error.
    NotFound(String),
    /// Action illegal for the current lifecycle state. Terminal client error.
    InvalidTransition(String),
    /// Unrecognized action token. Client protocol error, distinct from a
    /// missing resource.
    UnsupportedAction(String),
    /// Status callback presented a wrong or missing secret.
    InvalidSecret,
    /// Malformed request payload.
    Validation(String),
    /// CI/VCS provider call failed or timed out. No state was mutated.
    UpstreamUnavailable(String),
    Storage(StoreError),
}

impl OrchestratorError {
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::NotFound(_) => "not_found",
            OrchestratorError::InvalidTransition(_) => "invalid_transition",
            OrchestratorError::UnsupportedAction(_) => "unsupported_action",
            OrchestratorError::InvalidSecret => "invalid_secret",
            OrchestratorError::Validation(_) => "validation_failed",
            OrchestratorError::UpstreamUnavailable(_) => "upstream_unavailable",
            OrchestratorError::Storage(_) => "storage_error",
        }
    }
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::NotFound(msg)
            | OrchestratorError::InvalidTransition(msg)
            | OrchestratorError::UnsupportedAction(msg)
            | OrchestratorError::Validation(msg)
            | OrchestratorError::UpstreamUnavailable(msg) => f.write_str(msg),
            OrchestratorError::InvalidSecret => f.write_str("invalid pipeline secret"),
            OrchestratorError::Storage(err) => write!(f, "storage error: {:?}", err),
        }
    }
}

impl From<StoreError> for OrchestratorError {
    fn from(err: StoreError) -> Self {
        OrchestratorError::Storage(err)
    }
}

impl From<ProviderError> for OrchestratorError {
    fn from(err: ProviderError) -> Self {
        OrchestratorError::UpstreamUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
