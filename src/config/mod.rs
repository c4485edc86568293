//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub prompt: PromptConfig,
    pub clock: ClockConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// POSIX shell to run commands with (ignored on Windows)
    pub shell: Option<String>,

    /// Print a message when a command fails
    pub report_errors: bool,

    /// Echo command stderr as it is captured
    pub forward_stderr: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            shell: None,
            report_errors: true,
            forward_stderr: true,
        }
    }
}

/// Prompt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Show the full working directory instead of its last segment
    pub display_whole_path: bool,

    /// Decorate the prompt with ANSI colors
    pub colors: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            display_whole_path: false,
            colors: true,
        }
    }
}

/// Clock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Seconds between stopwatch ticks
    pub stopwatch_period_seconds: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            stopwatch_period_seconds: 1,
        }
    }
}

impl Config {
    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devterm")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[prompt]\ncolors = false\n").unwrap();
        assert!(!config.prompt.colors);
        assert!(!config.prompt.display_whole_path);
        assert!(config.general.report_errors);
        assert_eq!(config.clock.stopwatch_period_seconds, 1);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/no/such/devterm/config.toml")).unwrap();
        assert!(config.general.shell.is_none());
    }
}
