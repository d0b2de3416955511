// ==============================================================================
// verify.rs - Post-Deletion Verification
// ==============================================================================
// Description: Confirms a path is gone (or empty) after unlink
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-13
// Version: 1.0.0
// ==============================================================================

use std::io::ErrorKind;
use std::path::Path;
use tracing::error;

use crate::error::DeletionError;

#[derive(Debug, Default, Clone, Copy)]
pub struct DeletionVerifier;

impl DeletionVerifier {
    pub fn new() -> Self {
        Self
    }

    /// True when deletion of `path` is confirmed
    pub fn verify(&self, path: &Path) -> bool {
        self.check(path).is_ok()
    }

    /// Missing or zero-length passes; anything else is an error
    pub fn check(&self, path: &Path) -> Result<(), DeletionError> {
        match std::fs::symlink_metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => {
                error!("Verification could not stat {:?}: {}", path, source);
                Err(DeletionError::Stat {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Ok(metadata) if metadata.len() == 0 => Ok(()),
            Ok(metadata) => {
                error!(
                    "Verification failed: {:?} still present with {} bytes",
                    path,
                    metadata.len()
                );
                Err(DeletionError::VerificationFailed {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = DeletionVerifier::new();
        assert!(verifier.verify(&dir.path().join("never-existed")));
        // Repeated checks give the same answer
        assert!(verifier.verify(&dir.path().join("never-existed")));
    }

    #[test]
    fn test_empty_file_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        assert!(DeletionVerifier::new().verify(&path));
    }

    #[test]
    fn test_file_with_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leftover");
        std::fs::write(&path, b"still here").unwrap();

        let err = DeletionVerifier::new().check(&path).unwrap_err();
        assert!(matches!(err, DeletionError::VerificationFailed { size: 10, .. }));
    }
}
