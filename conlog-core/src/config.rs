//! Comparison configuration types
//!
//! This module defines everything a `Comparator` needs to know besides where
//! the trend files live. The CLI builds one from its flags and configuration
//! file and hands it over explicitly.

use crate::archive::{default_frametype, observatory_of};
use crate::channels::{read_channel_list, ChannelSelection};
use crate::types::{ConlogError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a channel comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConlogConfig {
    /// Interferometer prefix (e.g. `H1`)
    pub ifo: String,

    /// Frame type of the trend files (default: `{ifo}_T`)
    #[serde(default)]
    pub frametype: Option<String>,

    /// Length in seconds of each comparison window (default: 60)
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Number of trend files read concurrently (default: 1)
    #[serde(default = "default_nproc")]
    pub nproc: usize,

    /// Trend statistic to compare, `None` for all (default: `mean`)
    #[serde(default = "default_statistic")]
    pub statistic: Option<String>,

    /// Optional: only compare channels named in this file
    #[serde(default)]
    pub channel_list: Option<PathBuf>,

    /// Optional: only compare channels matching any of these expressions
    #[serde(default)]
    pub patterns: Vec<String>,
}

fn default_duration() -> f64 {
    60.0
}

fn default_nproc() -> usize {
    1
}

fn default_statistic() -> Option<String> {
    Some("mean".to_string())
}

impl ConlogConfig {
    /// Create a configuration with default settings for an interferometer
    pub fn new(ifo: impl Into<String>) -> Self {
        Self {
            ifo: ifo.into(),
            frametype: None,
            duration: default_duration(),
            nproc: default_nproc(),
            statistic: default_statistic(),
            channel_list: None,
            patterns: Vec::new(),
        }
    }

    /// Builder method: set the trend frame type
    pub fn with_frametype(mut self, frametype: impl Into<String>) -> Self {
        self.frametype = Some(frametype.into());
        self
    }

    /// Builder method: set the window length in seconds
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Builder method: set the number of concurrent file reads
    pub fn with_nproc(mut self, nproc: usize) -> Self {
        self.nproc = nproc;
        self
    }

    /// Builder method: set the trend statistic, `None` to keep all
    pub fn with_statistic(mut self, statistic: Option<&str>) -> Self {
        self.statistic = statistic.map(str::to_string);
        self
    }

    /// Builder method: set the channel-list file
    pub fn with_channel_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.channel_list = Some(path.into());
        self
    }

    /// Builder method: add a channel pattern
    pub fn add_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Frame type to search for
    pub fn frametype(&self) -> String {
        self.frametype
            .clone()
            .unwrap_or_else(|| default_frametype(&self.ifo))
    }

    /// Observatory code derived from the interferometer
    pub fn observatory(&self) -> String {
        observatory_of(&self.ifo)
    }

    /// Check that the configuration can drive a comparison
    pub fn validate(&self) -> Result<()> {
        if self.ifo.trim().is_empty() {
            return Err(ConlogError::InvalidInput("interferometer must not be empty".to_string()));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConlogError::InvalidInput(format!(
                "window duration must be positive, got {}",
                self.duration
            )));
        }
        if self.nproc == 0 {
            return Err(ConlogError::InvalidInput("nproc must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Build the channel selection described by this configuration
    ///
    /// Reads the channel-list file if one is configured.
    pub fn selection(&self) -> Result<ChannelSelection> {
        let mut selection = ChannelSelection::new()
            .with_statistic(self.statistic.as_deref())
            .with_patterns(&self.patterns)?;
        if let Some(path) = &self.channel_list {
            selection = selection.with_channel_list(read_channel_list(path)?);
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Channel;

    #[test]
    fn test_defaults() {
        let config = ConlogConfig::new("H1");
        assert_eq!(config.frametype(), "H1_T");
        assert_eq!(config.observatory(), "H");
        assert_eq!(config.duration, 60.0);
        assert_eq!(config.nproc, 1);
        assert_eq!(config.statistic.as_deref(), Some("mean"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ConlogConfig::new("L1")
            .with_frametype("L1_M")
            .with_duration(120.0)
            .with_nproc(4)
            .with_statistic(None)
            .add_pattern("^L1:SUS-");

        assert_eq!(config.frametype(), "L1_M");
        assert_eq!(config.duration, 120.0);
        assert_eq!(config.nproc, 4);
        assert!(config.statistic.is_none());
        assert_eq!(config.patterns, vec!["^L1:SUS-".to_string()]);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(ConlogConfig::new("").validate().is_err());
        assert!(ConlogConfig::new("H1").with_duration(0.0).validate().is_err());
        assert!(ConlogConfig::new("H1").with_duration(f64::NAN).validate().is_err());
        assert!(ConlogConfig::new("H1").with_nproc(0).validate().is_err());
    }

    #[test]
    fn test_selection_from_config() {
        let selection = ConlogConfig::new("H1").add_pattern("SUS").selection().unwrap();
        assert!(selection.accepts(&Channel::from("H1:SUS-X.mean")));
        assert!(!selection.accepts(&Channel::from("H1:SUS-X.max")));
        assert!(!selection.accepts(&Channel::from("H1:PSL-X.mean")));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ConlogConfig = serde_json::from_str(r#"{"ifo": "H1"}"#).unwrap();
        assert_eq!(config.duration, 60.0);
        assert_eq!(config.statistic.as_deref(), Some("mean"));
    }
}
