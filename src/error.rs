//! Error taxonomy for Italo.
//!
//! Every variant renders as the status line shown to the operator, so the
//! `Display` strings are user-facing text. Errors travel inside GUI messages
//! and therefore hold owned strings instead of source errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItaloError {
    #[error("Missing secrets file. Please fill in the template at {} and try again.", .0.display())]
    MissingSecrets(PathBuf),

    #[error("Failed to access secrets file {}: {reason}", .path.display())]
    SecretsAccess { path: PathBuf, reason: String },

    #[error("Failed to parse secrets file {}: {reason}", .path.display())]
    SecretsParse { path: PathBuf, reason: String },

    #[error("Secrets file {} still contains template placeholders.", .0.display())]
    SecretsIncomplete(PathBuf),

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Could not connect to server: {0}")]
    Connection(String),

    #[error("Server rejected the request: {0}")]
    RejectedRequest(String),

    #[error("No images to transfer. Search first.")]
    EmptyMatchSet,

    #[error("Target directory must be UNC-style.")]
    TargetNotUnc,

    #[error("Target directory does not exist: {0}")]
    TargetMissing(String),

    #[error("Copy failed for {source_path}: {reason}")]
    CopyFailed { source_path: String, reason: String },
}

impl From<reqwest::Error> for ItaloError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ItaloError::InvalidAddress(err.to_string())
        } else if err.is_connect() || err.is_timeout() {
            ItaloError::Connection(err.to_string())
        } else {
            ItaloError::RejectedRequest(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ItaloError::TargetNotUnc.to_string(),
            "Target directory must be UNC-style."
        );
        assert_eq!(
            ItaloError::EmptyMatchSet.to_string(),
            "No images to transfer. Search first."
        );
    }

    #[test]
    fn test_missing_secrets_names_path() {
        let err = ItaloError::MissingSecrets(PathBuf::from("secrets.json"));
        assert!(err.to_string().contains("secrets.json"));
    }
}
