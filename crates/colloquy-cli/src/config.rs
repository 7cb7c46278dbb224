//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for colloquy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay between demo reply chunks, in milliseconds
    pub reply_delay_ms: Option<u64>,
    /// Snippet length for the session list
    pub snippet_chars: Option<usize>,
    /// Verbose logging by default
    pub verbose: Option<bool>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colloquy")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for COLLOQUY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("COLLOQUY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(&path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert!(config.reply_delay_ms.is_none());
        assert!(config.snippet_chars.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str("reply_delay_ms = 25").unwrap();
        assert_eq!(config.reply_delay_ms, Some(25));
        assert!(config.verbose.is_none());
    }
}
