//! Configuration loading and merging
//!
//! Settings come from an optional TOML file with command-line flags layered
//! on top. `AppConfig::resolve` turns the result into everything a run
//! needs: the library configuration, the trend source and the report target.

use crate::report::ReportFormat;
use anyhow::{bail, Context, Result};
use conlog_core::{CacheFile, ConlogConfig, DirectoryArchive, TrendSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Report file written when no output path is configured
pub const DEFAULT_OUTPUT: &str = "changes.csv";

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataConfig {
    /// Directory searched recursively for trend files
    pub archive: Option<PathBuf>,
    /// LAL cache file listing trend files
    pub cache: Option<PathBuf>,
    pub frametype: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectionConfig {
    pub channel_list: Option<PathBuf>,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub statistic: Option<String>,
    #[serde(default)]
    pub all_statistics: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompareConfig {
    pub duration: Option<f64>,
    pub nproc: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    pub format: Option<ReportFormat>,
}

/// Where trend files come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Archive(PathBuf),
    Cache(PathBuf),
}

impl SourceSpec {
    /// Open the trend source
    pub fn open(&self) -> Result<Box<dyn TrendSource>> {
        match self {
            SourceSpec::Archive(root) => {
                if !root.is_dir() {
                    bail!("Archive directory not found: {:?}", root);
                }
                Ok(Box::new(DirectoryArchive::new(root)))
            }
            SourceSpec::Cache(path) => {
                let cache = CacheFile::read(path)
                    .with_context(|| format!("Failed to read cache file: {:?}", path))?;
                Ok(Box::new(cache))
            }
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: ConlogConfig,
    pub source: SourceSpec,
    pub output: PathBuf,
    pub format: ReportFormat,
}

impl AppConfig {
    /// Layer `overrides` (usually built from command-line flags) on top
    pub fn merge(&mut self, overrides: AppConfig) {
        let AppConfig {
            data,
            selection,
            compare,
            output,
        } = overrides;

        // An archive or cache on the command line replaces either source
        if data.archive.is_some() || data.cache.is_some() {
            self.data.archive = data.archive;
            self.data.cache = data.cache;
        }
        if data.frametype.is_some() {
            self.data.frametype = data.frametype;
        }

        if selection.channel_list.is_some() {
            self.selection.channel_list = selection.channel_list;
        }
        if !selection.patterns.is_empty() {
            self.selection.patterns = selection.patterns;
        }
        if selection.all_statistics {
            self.selection.all_statistics = true;
            self.selection.statistic = None;
        } else if selection.statistic.is_some() {
            self.selection.all_statistics = false;
            self.selection.statistic = selection.statistic;
        }

        if compare.duration.is_some() {
            self.compare.duration = compare.duration;
        }
        if compare.nproc.is_some() {
            self.compare.nproc = compare.nproc;
        }

        if output.path.is_some() {
            self.output.path = output.path;
        }
        if output.format.is_some() {
            self.output.format = output.format;
        }
    }

    /// Resolve the settings for comparing channels of `ifo`
    pub fn resolve(&self, ifo: &str) -> Result<RunSettings> {
        let source = match (&self.data.archive, &self.data.cache) {
            (Some(archive), None) => SourceSpec::Archive(archive.clone()),
            (None, Some(cache)) => SourceSpec::Cache(cache.clone()),
            (Some(_), Some(_)) => bail!("Configure either an archive or a cache, not both"),
            (None, None) => bail!("No trend data source: pass --archive DIR or --cache FILE"),
        };

        let mut config = ConlogConfig::new(ifo);
        if let Some(frametype) = &self.data.frametype {
            config = config.with_frametype(frametype.as_str());
        }
        if let Some(duration) = self.compare.duration {
            config = config.with_duration(duration);
        }
        if let Some(nproc) = self.compare.nproc {
            config = config.with_nproc(nproc);
        }
        if self.selection.all_statistics {
            config = config.with_statistic(None);
        } else if let Some(statistic) = &self.selection.statistic {
            config = config.with_statistic(Some(statistic.as_str()));
        }
        if let Some(path) = &self.selection.channel_list {
            config = config.with_channel_list(path);
        }
        for pattern in &self.selection.patterns {
            config = config.add_pattern(pattern.as_str());
        }
        config.validate().context("Invalid comparison settings")?;

        let output = self
            .output
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let format = self
            .output
            .format
            .unwrap_or_else(|| ReportFormat::from_path(&output));

        Ok(RunSettings {
            config,
            source,
            output,
            format,
        })
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
