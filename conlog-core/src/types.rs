//! Core types for the conlog library
//!
//! This module defines the fundamental types shared by every stage of a
//! comparison: channel identifiers, GPS segments, change records and the
//! library error type.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

/// GPS time in seconds since 1980-01-06T00:00:00 UTC
pub type GpsTime = f64;

/// Result type for conlog operations
pub type Result<T> = std::result::Result<T, ConlogError>;

/// Name of a detector auxiliary data stream
///
/// Channel names are opaque: they are compared by string equality and
/// ordering only. Second-trend names look like `H1:SYS-FOO.mean` or
/// `H1:SYS-FOO.mean,s-trend`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Create a channel from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Channel name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trend statistic suffix of the channel name, if any
    ///
    /// `H1:SYS-FOO.mean,s-trend` and `H1:SYS-FOO.mean` both give `mean`.
    pub fn trend_statistic(&self) -> Option<&str> {
        let name = match self.0.split_once(',') {
            Some((name, _)) => name,
            None => &self.0,
        };
        name.rsplit_once('.')
            .map(|(_, statistic)| statistic)
            .filter(|statistic| !statistic.is_empty())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Channel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Half-open GPS interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: GpsTime,
    pub end: GpsTime,
}

impl Segment {
    pub fn new(start: GpsTime, end: GpsTime) -> Self {
        Self { start, end }
    }

    /// The window of `duration` seconds ending at `time`
    pub fn before(time: GpsTime, duration: f64) -> Self {
        Self::new(time - duration, time)
    }

    /// The window of `duration` seconds starting at `time`
    pub fn after(time: GpsTime, duration: f64) -> Self {
        Self::new(time, time + duration)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True if both segments share some time
    pub fn intersects(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `time` lies inside this segment
    pub fn contains(&self, time: GpsTime) -> bool {
        self.start <= time && time < self.end
    }

    /// Overlap of two segments, if they intersect
    pub fn intersection(&self, other: &Segment) -> Option<Segment> {
        if !self.intersects(other) {
            return None;
        }
        Some(Segment::new(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One channel whose value changed across the comparison boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Channel that changed
    pub channel: Channel,
    /// Last sample of the reference window
    pub initial_value: f64,
    /// First sample of the comparison window
    pub final_value: f64,
    /// `final_value - initial_value`
    pub difference: f64,
}

impl ChangeRecord {
    pub fn new(channel: Channel, initial_value: f64, final_value: f64) -> Self {
        Self {
            channel,
            initial_value,
            final_value,
            difference: final_value - initial_value,
        }
    }
}

/// Errors that can occur while locating, reading or comparing trend data
#[derive(Debug, thiserror::Error)]
pub enum ConlogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("No {frametype} files found for observatory {observatory} in [{start}, {end})")]
    NoFilesFound {
        observatory: String,
        frametype: String,
        start: GpsTime,
        end: GpsTime,
    },

    #[error("Failed to parse cache file {path:?} at line {line}: {reason}")]
    CacheParseError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to parse trend file {path:?} at line {line}: {reason}")]
    TrendParseError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Unsupported trend file format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Channel {channel} not found in {path:?}")]
    ChannelNotFound { channel: String, path: PathBuf },

    #[error("Failed to read channel list {path:?}: {reason}")]
    ChannelListError { path: PathBuf, reason: String },

    #[error("No channels left to compare: {0}")]
    NoChannels(String),

    #[error("Data gap for {channel}: {reason}")]
    DataGap { channel: String, reason: String },

    #[error("Invalid channel pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
