/// Analyzer configuration — RON loading and start-up validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::strategy::Strategy;
use crate::schema::emotion::EmotionNames;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

fn default_lexicon_name() -> String {
    "default".to_string()
}

fn default_cache_capacity() -> usize {
    16
}

/// Everything the analyzer needs to know before the first request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Language passed to the tokenizer, e.g. `"italian"`.
    #[serde(default)]
    pub language: String,
    /// Length N of every emotion vector.
    #[serde(default)]
    pub emotion_count: usize,
    /// Optional display names, one per emotion.
    #[serde(default)]
    pub emotion_names: Vec<String>,
    #[serde(default)]
    pub default_strategy: Strategy,
    /// Lexicon variant used when a request does not name one.
    #[serde(default = "default_lexicon_name")]
    pub default_lexicon: String,
    /// Lexicon variant name → RON file.
    #[serde(default)]
    pub lexicons: BTreeMap<String, String>,
    /// Run `preprocess_for_analysis` before tokenizing.
    #[serde(default)]
    pub preprocess: bool,
    /// Sessions kept by the re-smoothing cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            language: String::new(),
            emotion_count: 0,
            emotion_names: Vec::new(),
            default_strategy: Strategy::default(),
            default_lexicon: default_lexicon_name(),
            lexicons: BTreeMap::new(),
            preprocess: false,
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl AnalyzerConfig {
    /// Minimal configuration for the given language and emotion count.
    pub fn new(language: impl Into<String>, emotion_count: usize) -> Self {
        Self {
            language: language.into(),
            emotion_count,
            ..Self::default()
        }
    }

    /// Load and validate a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<AnalyzerConfig, ConfigError> {
        tracing::info!("Loading analyzer configuration from: {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<AnalyzerConfig, ConfigError> {
        let config: AnalyzerConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Missing("language"));
        }
        if self.emotion_count == 0 {
            return Err(ConfigError::Missing("emotion_count"));
        }
        if !self.emotion_names.is_empty() && self.emotion_names.len() != self.emotion_count {
            return Err(ConfigError::Invalid(format!(
                "{} emotion names for {} emotions",
                self.emotion_names.len(),
                self.emotion_count
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn names(&self) -> EmotionNames {
        EmotionNames::new(self.emotion_names.clone())
    }
}
