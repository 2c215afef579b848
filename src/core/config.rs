use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::core::options::GenerationOptions;

/// Default maximum completion length when neither config nor flag sets one
pub const DEFAULT_MAX_LENGTH: u64 = 512;

/// Project configuration from weft.toml
#[derive(Debug, Clone, Deserialize)]
pub struct WeftConfig {
    pub model: ModelConfig,
    /// Construction-time default request options
    #[serde(default)]
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub default: String,
    #[serde(default = "default_max_length")]
    pub max_length: u64,
}

fn default_max_length() -> u64 {
    DEFAULT_MAX_LENGTH
}

impl WeftConfig {
    /// Load and validate configuration from a weft.toml file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: WeftConfig = toml::from_str(content).context("Failed to parse weft.toml")?;

        config.validate()?;
        Ok(config)
    }

    /// Find the nearest weft.toml by walking up from the given directory.
    ///
    /// Discovery only: a `Some` path may still fail to parse or validate.
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();
        loop {
            let config_path = current.join("weft.toml");
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Find and load weft.toml by walking up from the given directory
    pub fn find_and_load(start_dir: &Path) -> Result<(Self, PathBuf)> {
        let Some(config_path) = Self::discover(start_dir) else {
            bail!(
                "weft.toml not found in {} or any parent directory",
                start_dir.display()
            );
        };

        let config = Self::from_file(&config_path)?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok((config, root))
    }

    fn validate(&self) -> Result<()> {
        if self.model.default.is_empty() {
            bail!("Empty model identifier in weft.toml");
        }

        if self.model.max_length == 0 {
            bail!("Invalid max_length 0 in weft.toml. Must be at least 1.");
        }

        Ok(())
    }
}
