// ==============================================================================
// config.rs - Secure Deletion Configuration
// ==============================================================================
// Description: `secureDelete` settings loaded from JSON with safe defaults
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::overwrite::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::plan::{PlanOptions, DEFAULT_GROWTH_FACTOR};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShredConfig {
    /// Root of the upload tree (`<root>/<room>/<user>/...`)
    pub storage_root: PathBuf,

    /// When false, files are unlinked and verified without overwriting
    pub enabled: bool,

    /// Resize/timestamp/permission scrub on rotating media
    pub change_metadata: bool,

    /// Length multiplier for the rotating-media scrub step
    pub growth_factor: u64,

    /// Write chunk size in bytes
    #[serde(alias = "bufferSize")]
    pub chunk_size: usize,

    /// Broadcast failures to the affected room
    pub report_errors: bool,

    /// Only attachment URLs under this prefix are resolved to files
    pub attachment_url_prefix: String,
}

impl Default for ShredConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("uploads"),
            enabled: true,
            change_metadata: true,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_errors: true,
            attachment_url_prefix: "/uploads/".to_string(),
        }
    }
}

impl ShredConfig {
    /// Load from a JSON file, or defaults if the file does not exist.
    ///
    /// Accepts either a bare settings object or a server config with the
    /// settings nested under `secureDelete`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut value: serde_json::Value =
            serde_json::from_str(&raw).context("Config file is not valid JSON")?;

        if let Some(nested) = value.get_mut("secureDelete") {
            value = nested.take();
        }

        let config: ShredConfig =
            serde_json::from_value(value).context("Invalid secure delete configuration")?;
        config.validate()?;

        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.growth_factor == 0 {
            anyhow::bail!("growthFactor must be at least 1");
        }
        if self.chunk_size < MIN_CHUNK_SIZE {
            anyhow::bail!(
                "chunkSize too small: {} bytes (min: {} bytes)",
                self.chunk_size,
                MIN_CHUNK_SIZE
            );
        }
        Ok(())
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            secure: self.enabled,
            change_metadata: self.change_metadata,
            growth_factor: self.growth_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShredConfig::load(&dir.path().join("config.json")).unwrap();
        assert!(config.enabled);
        assert_eq!(config.growth_factor, 3);
        assert_eq!(config.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_nested_server_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"port": 3000, "secureDelete": {{"enabled": false, "bufferSize": 65536, "reportErrors": false}}}}"#
        )
        .unwrap();
        temp_file.flush().unwrap();

        let config = ShredConfig::load(temp_file.path()).unwrap();
        assert!(!config.enabled);
        assert!(!config.report_errors);
        assert_eq!(config.chunk_size, 65536);
        assert!(config.change_metadata);
        assert!(!config.plan_options().secure);
    }

    #[test]
    fn test_zero_growth_factor_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"growthFactor": 0}}"#).unwrap();
        temp_file.flush().unwrap();

        assert!(ShredConfig::load(temp_file.path()).is_err());
    }
}
