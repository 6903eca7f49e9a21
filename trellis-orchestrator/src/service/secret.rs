//! Per-instance secret management
//!
//! Each started instance carries an opaque token that authorizes status
//! callbacks from the running job. Secrets are issued at start time (a
//! `Created` instance needs no callback authorization yet) and are
//! write-once.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Placeholder rendered in place of a secret that does not exist yet or
/// must not be shown.
pub const REDACTED_PLACEHOLDER: &str = "***censored***";

const SECRET_LENGTH: usize = 40;

/// Issues and validates per-instance callback secrets
#[derive(Debug, Clone, Default)]
pub struct SecretManager;

impl SecretManager {
    pub fn new() -> Self {
        Self
    }

    /// Generates a fresh unguessable token.
    pub fn issue(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LENGTH)
            .map(char::from)
            .collect()
    }

    /// The secret itself when one exists, the fixed placeholder otherwise.
    ///
    /// Lets callers render a job-definition document uniformly before a run
    /// has started.
    pub fn redact(secret: Option<&str>) -> &str {
        secret.unwrap_or(REDACTED_PLACEHOLDER)
    }

    /// Checks a presented secret against the stored one.
    ///
    /// The comparison does not short-circuit on the first mismatching byte.
    pub fn verify(expected: &str, presented: &str) -> bool {
        if expected.len() != presented.len() {
            return false;
        }

        expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_shape() {
        let secret = SecretManager::new().issue();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_issue_is_unguessable_enough() {
        let manager = SecretManager::new();
        assert_ne!(manager.issue(), manager.issue());
    }

    #[test]
    fn test_redact() {
        assert_eq!(SecretManager::redact(None), "***censored***");
        assert_eq!(SecretManager::redact(Some("abc123")), "abc123");
    }

    #[test]
    fn test_verify() {
        assert!(SecretManager::verify("tok", "tok"));
        assert!(!SecretManager::verify("tok", "TOK"));
        assert!(!SecretManager::verify("tok", "tokk"));
        assert!(!SecretManager::verify("tok", ""));
    }
}
