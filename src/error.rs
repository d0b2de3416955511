// ==============================================================================
// error.rs - Secure Deletion Error Taxonomy
// ==============================================================================
// Description: Errors raised while detecting, overwriting, scrubbing, unlinking
//              and verifying files scheduled for secure deletion
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use std::path::PathBuf;
use thiserror::Error;

use crate::models::DeletionStage;

/// Errors that can occur during a secure deletion request
#[derive(Error, Debug)]
pub enum DeletionError {
    /// Storage medium probe failed (never fatal, resolved to `Unknown`)
    #[error("Storage detection failed: {reason}")]
    Detection { reason: String },

    #[error("Failed to stat {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a regular file: {path:?}")]
    NotARegularFile { path: PathBuf },

    #[error("Path escapes the storage root: {path:?}")]
    OutsideStorageRoot { path: PathBuf },

    #[error("Directory not found: {path:?}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Overwrite failed for {path:?} at offset {offset}: {source}")]
    OverwriteIo {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata scrub step '{step}' failed for {path:?}: {source}")]
    Scrub {
        path: PathBuf,
        step: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to unlink {path:?}: {source}")]
    Unlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unlink reported success but the file is still there with content
    #[error("Verification failed: {path:?} still present with {size} bytes")]
    VerificationFailed { path: PathBuf, size: u64 },

    #[error("Failed to read message metadata {path:?}: {source}")]
    Lookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Deletion task failed: {0}")]
    Task(String),
}

impl DeletionError {
    /// Stage of the deletion state machine in which this error occurred
    pub fn stage(&self) -> DeletionStage {
        match self {
            DeletionError::Detection { .. } => DeletionStage::Start,
            DeletionError::Stat { .. }
            | DeletionError::NotARegularFile { .. }
            | DeletionError::OutsideStorageRoot { .. }
            | DeletionError::DirectoryNotFound { .. }
            | DeletionError::Lookup { .. }
            | DeletionError::Task(_) => DeletionStage::DetectSymlink,
            DeletionError::OverwriteIo { .. } | DeletionError::Scrub { .. } => {
                DeletionStage::OverwriteScheduled
            }
            DeletionError::Unlink { .. } => DeletionStage::PassesComplete,
            DeletionError::VerificationFailed { .. } => DeletionStage::Unlinked,
        }
    }
}

impl From<tokio::task::JoinError> for DeletionError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeletionError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failure_is_distinct_from_unlink() {
        let unlink = DeletionError::Unlink {
            path: PathBuf::from("/tmp/a"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let verify = DeletionError::VerificationFailed {
            path: PathBuf::from("/tmp/a"),
            size: 12,
        };

        assert_eq!(unlink.stage(), DeletionStage::PassesComplete);
        assert_eq!(verify.stage(), DeletionStage::Unlinked);
        assert!(verify.to_string().contains("12 bytes"));
        assert!(unlink.to_string().starts_with("Failed to unlink"));
    }
}
