//! Loop configuration.
//!
//! Everything has a sensible default; a YAML file can override any field.
//! The core never persists configuration.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Model id interpolated into the converse endpoint URL.
    pub model_id: String,
    /// Appended to the built-in system prompt.
    pub system_prompt_suffix: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Keep only this many most-recent tool-result screenshots.
    /// `None` retains everything.
    pub image_retention_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: "anthropic.claude-sonnet-4-20250514-v1:0".into(),
            system_prompt_suffix: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 1.0,
            image_retention_limit: Some(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl Config {
    pub fn from_yaml(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}
