use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DedupError, Result};

pub const DEFAULT_MIN_SCORE: u8 = 40;
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Detection settings, loaded from `~/.config/convoca/dedup.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Matches scoring below this are dropped.
    pub min_score: u8,
    /// Upper bound on returned matches.
    pub max_results: usize,
    /// Classify candidates on the rayon pool.
    pub parallel: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
            parallel: true,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl DedupConfig {
    /// Standard config file path: `~/.config/convoca/dedup.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CONVOCA_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("convoca")
            .join("dedup.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_score > 100 {
            return Err(DedupError::InvalidConfig(format!(
                "min_score must be within 0..=100, got {}",
                self.min_score
            )));
        }
        if self.max_results == 0 {
            return Err(DedupError::InvalidConfig(
                "max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
