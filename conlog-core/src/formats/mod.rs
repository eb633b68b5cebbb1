//! Trend file format parsers (CSV, ASCII)
//!
//! This module contains parsers for the text trend-file formats. Every format
//! stores one GPS column followed by one column per channel; the parser is
//! chosen from the file extension.

use crate::timeseries::TimeSeries;
use crate::types::{Channel, ConlogError, Result};
use std::collections::HashMap;
use std::path::Path;

pub mod text;

// Re-export parser types
pub use text::{Delimiter, TextTrendParser};

/// File extensions with a registered parser
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "txt", "dat"];

/// Common trait for all trend file parsers
///
/// This trait provides a unified interface for reading channel names and
/// channel data out of a single trend file.
pub trait TrendFileParser: Send + Sync {
    /// List every channel stored in the file, in column order
    fn read_channel_names(&self, path: &Path) -> Result<Vec<Channel>>;

    /// Read the requested channels from the file
    fn read(&self, path: &Path, channels: &[Channel]) -> Result<HashMap<Channel, TimeSeries>>;
}

/// Pick the parser for a trend file from its extension
pub fn parser_for(path: &Path) -> Result<Box<dyn TrendFileParser>> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("csv") => Ok(Box::new(TextTrendParser::new(Delimiter::Comma))),
        Some("txt") | Some("dat") => Ok(Box::new(TextTrendParser::new(Delimiter::Whitespace))),
        _ => Err(ConlogError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// True if `path` has an extension some parser understands
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| SUPPORTED_EXTENSIONS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}
