// ==============================================================================
// overwrite.rs - Single Overwrite Pass
// ==============================================================================
// Description: In-place chunked overwrite of a file followed by a mandatory sync
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use rand::RngCore;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use crate::error::DeletionError;

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB
pub const MIN_CHUNK_SIZE: usize = 4096;

/// Byte-fill strategy for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStrategy {
    RandomBytes,
    /// Short pattern tiled across each chunk
    FixedPattern(Vec<u8>),
}

impl FillStrategy {
    /// 16 zero bytes, the final pass on rotating media
    pub fn zeros() -> Self {
        FillStrategy::FixedPattern(vec![0u8; 16])
    }

    pub fn name(&self) -> &'static str {
        match self {
            FillStrategy::RandomBytes => "random",
            FillStrategy::FixedPattern(_) => "fixed-pattern",
        }
    }

    fn fill(&self, buffer: &mut [u8]) {
        match self {
            FillStrategy::RandomBytes => rand::thread_rng().fill_bytes(buffer),
            FillStrategy::FixedPattern(pattern) => {
                if pattern.is_empty() {
                    buffer.fill(0);
                    return;
                }
                for (i, byte) in buffer.iter_mut().enumerate() {
                    *byte = pattern[i % pattern.len()];
                }
            }
        }
    }
}

/// Overwrites a file in place with a fill strategy
#[derive(Debug, Clone, Copy)]
pub struct OverwritePass {
    chunk_size: usize,
}

impl OverwritePass {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(MIN_CHUNK_SIZE),
        }
    }

    /// Chunk buffer size for a pass of `total_length` bytes
    fn buffer_len(&self, total_length: u64) -> usize {
        usize::try_from(total_length).map_or(self.chunk_size, |n| n.min(self.chunk_size))
    }

    /// Overwrite the first `total_length` bytes of `path` and sync.
    ///
    /// The file is opened without truncation so the same inode is rewritten.
    /// Returns the number of bytes written, which always equals
    /// `total_length` on success.
    pub fn run(
        &self,
        path: &Path,
        total_length: u64,
        fill: &FillStrategy,
    ) -> Result<u64, DeletionError> {
        if total_length == 0 {
            debug!("Zero-length overwrite of {:?}, nothing to write", path);
            return Ok(0);
        }

        let io_err = |offset: u64| {
            let path = path.to_path_buf();
            move |source: std::io::Error| DeletionError::OverwriteIo {
                path,
                offset,
                source,
            }
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(io_err(0))?;

        file.seek(SeekFrom::Start(0)).map_err(io_err(0))?;

        // One buffer per pass: random data is generated once and reused
        let buffer_len = self.buffer_len(total_length);
        let mut buffer = vec![0u8; buffer_len];
        fill.fill(&mut buffer);

        let mut written: u64 = 0;
        while written < total_length {
            let to_write = (total_length - written).min(buffer_len as u64) as usize;
            file.write_all(&buffer[..to_write])
                .map_err(io_err(written))?;
            written += to_write as u64;
        }

        file.flush().map_err(io_err(written))?;
        file.sync_all().map_err(io_err(written))?;

        debug!(
            "Overwrote {} bytes of {:?} with {} fill",
            written,
            path,
            fill.name()
        );
        Ok(written)
    }
}

impl Default for OverwritePass {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_random_pass_writes_exact_length() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let original = vec![0xAAu8; 10_000];
        temp_file.write_all(&original).unwrap();
        temp_file.flush().unwrap();

        // Small chunk so the loop crosses several chunk boundaries
        let pass = OverwritePass::new(MIN_CHUNK_SIZE);
        let written = pass
            .run(temp_file.path(), 10_000, &FillStrategy::RandomBytes)
            .unwrap();

        assert_eq!(written, 10_000);
        let after = std::fs::read(temp_file.path()).unwrap();
        assert_eq!(after.len(), 10_000);
        assert_ne!(after, original);
    }

    #[test]
    fn test_fixed_pattern_tiles_across_chunks() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&[0xFFu8; 5000]).unwrap();
        temp_file.flush().unwrap();

        let pass = OverwritePass::new(MIN_CHUNK_SIZE);
        let pattern = FillStrategy::FixedPattern(vec![1, 2, 3]);
        pass.run(temp_file.path(), 5000, &pattern).unwrap();

        let after = std::fs::read(temp_file.path()).unwrap();
        assert_eq!(after.len(), 5000);
        // Every chunk starts the pattern over at index 0
        assert_eq!(&after[..6], &[1, 2, 3, 1, 2, 3]);
        assert_eq!(after[MIN_CHUNK_SIZE], 1);
    }

    #[test]
    fn test_buffer_never_exceeds_chunk_size() {
        let pass = OverwritePass::new(MIN_CHUNK_SIZE);
        assert_eq!(pass.buffer_len(10), 10);
        assert_eq!(pass.buffer_len(u64::MAX), MIN_CHUNK_SIZE);
        assert_eq!(pass.buffer_len(u64::from(u32::MAX) + 1), MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_pass_extends_shorter_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"abc").unwrap();
        temp_file.flush().unwrap();

        OverwritePass::default()
            .run(temp_file.path(), 9, &FillStrategy::zeros())
            .unwrap();

        assert_eq!(std::fs::read(temp_file.path()).unwrap(), vec![0u8; 9]);
    }

    #[test]
    fn test_zero_length_is_noop() {
        let temp_file = NamedTempFile::new().unwrap();
        let written = OverwritePass::default()
            .run(temp_file.path(), 0, &FillStrategy::RandomBytes)
            .unwrap();
        assert_eq!(written, 0);
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_missing_file_is_overwrite_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OverwritePass::default()
            .run(&dir.path().join("missing"), 10, &FillStrategy::RandomBytes)
            .unwrap_err();
        assert!(matches!(err, DeletionError::OverwriteIo { offset: 0, .. }));
    }

    #[test]
    fn test_pass_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never");
        let _ = OverwritePass::default().run(&path, 10, &FillStrategy::zeros());
        assert!(!path.exists());
    }
}
