// ==============================================================================
// scrub.rs - Metadata Scrubbing
// ==============================================================================
// Description: Resizes a file, resets its timestamps to the epoch and relaxes
//              its permissions before the final overwrite pass
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use filetime::FileTime;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::DeletionError;

/// Best-effort metadata obfuscation for rotating media
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataScrubber;

impl MetadataScrubber {
    pub fn new() -> Self {
        Self
    }

    /// Run all three scrub steps. Every step is attempted even if an earlier
    /// one fails; the first failure is returned.
    pub fn scrub(&self, path: &Path, new_length: u64) -> Result<(), DeletionError> {
        let steps = [
            ("resize", self.resize(path, new_length)),
            ("reset-timestamps", self.reset_timestamps(path)),
            ("relax-permissions", self.relax_permissions(path)),
        ];

        let mut first_error = None;
        for (step, result) in steps {
            if let Err(source) = result {
                warn!("Metadata scrub step '{}' failed for {:?}: {}", step, path, source);
                first_error.get_or_insert(DeletionError::Scrub {
                    path: path.to_path_buf(),
                    step,
                    source,
                });
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Scrubbed metadata of {:?} (length now {})", path, new_length);
                Ok(())
            }
        }
    }

    fn resize(&self, path: &Path, new_length: u64) -> std::io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(new_length)?;
        file.sync_all()
    }

    fn reset_timestamps(&self, path: &Path) -> std::io::Result<()> {
        let epoch = FileTime::zero();
        filetime::set_file_times(path, epoch, epoch)
    }

    #[cfg(unix)]
    fn relax_permissions(&self, path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777))
    }

    #[cfg(not(unix))]
    fn relax_permissions(&self, path: &Path) -> std::io::Result<()> {
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms)
    }
}
