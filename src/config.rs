//! Processor configuration
//!
//! Settings that shape how renders run rather than what they sound like.
//! Loaded from an optional JSON file, then overridden by environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FxError, Result};

/// Reference render block size in frames
pub const DEFAULT_BLOCK_FRAMES: usize = 4096;

/// Environment override for the scratch directory
pub const ENV_CACHE_DIR: &str = "FXCHAIN_CACHE_DIR";

/// Environment override for the render block size
pub const ENV_BLOCK_FRAMES: &str = "FXCHAIN_BLOCK_FRAMES";

/// Runtime configuration for `AudioProcessor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Directory that receives rendered files
    pub cache_dir: PathBuf,
    /// Maximum frames pulled through the chain per render call
    pub max_block_frames: usize,
    /// Cap on consecutive transient render statuses (None = unbounded)
    pub max_transient_retries: Option<u64>,
    /// Leave a partially written output file behind after a failed render
    pub keep_partial_output: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_block_frames: DEFAULT_BLOCK_FRAMES,
            max_transient_retries: None,
            keep_partial_output: false,
        }
    }
}

impl ProcessorConfig {
    /// Configuration rendering into the given directory
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    ///
    /// Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FxError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: ProcessorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FXCHAIN_CACHE_DIR` / `FXCHAIN_BLOCK_FRAMES` overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            debug!(cache_dir = %dir, "cache dir overridden from environment");
            self.cache_dir = PathBuf::from(dir);
        }
        if let Ok(frames) = std::env::var(ENV_BLOCK_FRAMES) {
            self.max_block_frames = frames.trim().parse().map_err(|_| FxError::Config {
                reason: format!("{} must be a positive integer, got '{}'", ENV_BLOCK_FRAMES, frames),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the renderer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_block_frames == 0 {
            return Err(FxError::Config {
                reason: "max_block_frames must be greater than 0".to_string(),
            });
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(FxError::Config {
                reason: "cache_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Platform cache directory for rendered files
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fxchain")
}
