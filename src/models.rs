// ==============================================================================
// models.rs - Secure Deletion Data Models
// ==============================================================================
// Description: Storage medium, deletion targets, results and stages
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DeletionError;

/// Primary storage medium of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMedium {
    /// Flash storage (SSD, NVMe)
    SolidState,
    /// Magnetic rotating disk
    Rotating,
    /// Detection failed or was inconclusive
    Unknown,
}

impl StorageMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMedium::SolidState => "SSD",
            StorageMedium::Rotating => "HDD",
            StorageMedium::Unknown => "Unknown",
        }
    }

    /// Rotating and Unknown media both take the multi-pass plan
    pub fn is_conservative(&self) -> bool {
        !matches!(self, StorageMedium::SolidState)
    }
}

/// A single file scheduled for deletion, with its owning context.
///
/// Built fresh for every request and consumed by the deleter, so a target
/// can never be fed through two plans.
#[derive(Debug)]
pub struct DeletionTarget {
    /// Path of the file (or link) to delete
    pub path: PathBuf,

    /// Room the file belongs to, used for failure broadcasts
    pub room: Option<String>,

    /// User that owns the file
    pub user: Option<String>,

    /// Byte length at the time the request was made
    pub length: u64,

    /// Whether the path is a symbolic link (never overwritten)
    pub is_symlink: bool,

    /// Whether the path is a directory or other non-regular entry
    pub is_regular: bool,
}

impl DeletionTarget {
    /// Inspect `path` without following symlinks and build a target for it
    pub fn inspect(
        path: impl Into<PathBuf>,
        room: Option<String>,
        user: Option<String>,
    ) -> Result<Self, DeletionError> {
        let path = path.into();
        let metadata = std::fs::symlink_metadata(&path).map_err(|source| DeletionError::Stat {
            path: path.clone(),
            source,
        })?;
        let file_type = metadata.file_type();

        Ok(Self {
            length: if file_type.is_symlink() { 0 } else { metadata.len() },
            is_symlink: file_type.is_symlink(),
            is_regular: file_type.is_file(),
            path,
            room,
            user,
        })
    }
}

/// Outcome of a single-file deletion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionResult {
    Success,
    /// File still present after unlink with `size` bytes
    VerificationFailed { size: u64 },
    IoError(String),
}

impl DeletionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeletionResult::Success)
    }
}

impl From<Result<(), DeletionError>> for DeletionResult {
    fn from(result: Result<(), DeletionError>) -> Self {
        match result {
            Ok(()) => DeletionResult::Success,
            Err(DeletionError::VerificationFailed { size, .. }) => {
                DeletionResult::VerificationFailed { size }
            }
            Err(e) => DeletionResult::IoError(e.to_string()),
        }
    }
}

/// States a deletion request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStage {
    Start,
    DetectSymlink,
    SymlinkRemoved,
    OverwriteScheduled,
    PassesComplete,
    Unlinked,
    Verified,
    Done,
}

/// Format a byte count for log output ("0 Bytes", "1.5 KB", "3 MB")
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exponent])
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_medium_is_conservative() {
        assert!(StorageMedium::Unknown.is_conservative());
        assert!(StorageMedium::Rotating.is_conservative());
        assert!(!StorageMedium::SolidState.is_conservative());
        assert_eq!(StorageMedium::SolidState.as_str(), "SSD");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3 MB");
    }

    #[test]
    fn test_inspect_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"0123456789").unwrap();

        let target = DeletionTarget::inspect(&path, Some("lobby".into()), None).unwrap();
        assert_eq!(target.length, 10);
        assert!(target.is_regular);
        assert!(!target.is_symlink);
        assert_eq!(file_name_of(&target.path), "photo.jpg");
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeletionTarget::inspect(dir.path().join("gone"), None, None).unwrap_err();
        assert!(matches!(err, DeletionError::Stat { .. }));
    }

    #[test]
    fn test_result_from_verification_error() {
        let result: DeletionResult = Err(DeletionError::VerificationFailed {
            path: PathBuf::from("/tmp/x"),
            size: 7,
        })
        .into();
        assert_eq!(result, DeletionResult::VerificationFailed { size: 7 });
        assert!(!result.is_success());
    }
}
