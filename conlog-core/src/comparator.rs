//! Main comparison API
//!
//! The `Comparator` is the entry point of the library: it locates the trend
//! files around the two GPS times, works out which channels to compare,
//! reads both windows and runs the change detector.

use crate::archive::{TrendFile, TrendSource};
use crate::channels::available_channels;
use crate::config::ConlogConfig;
use crate::detector::detect_changes;
use crate::formats;
use crate::reader::read_window;
use crate::timeseries::TimeSeries;
use crate::types::{ChangeRecord, Channel, ConlogError, GpsTime, Result, Segment};
use std::collections::HashMap;

/// Outcome of a comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Channels whose value changed, sorted by channel
    pub records: Vec<ChangeRecord>,
    /// Number of channels compared
    pub channels_examined: usize,
    /// Reference window, ending at the start time
    pub before: Segment,
    /// Comparison window, starting at the end time
    pub after: Segment,
}

/// Compares constant channels between two GPS times
pub struct Comparator {
    source: Box<dyn TrendSource>,
    config: ConlogConfig,
}

impl Comparator {
    /// Create a comparator reading trend files from `source`
    pub fn new(source: Box<dyn TrendSource>, config: ConlogConfig) -> Self {
        Self { source, config }
    }

    /// The reference and comparison windows for a start and end time
    pub fn windows(&self, start: GpsTime, end: GpsTime) -> Result<(Segment, Segment)> {
        self.config.validate()?;
        if !(end > start) {
            return Err(ConlogError::InvalidInput(format!(
                "end time {} must be after start time {}",
                end, start
            )));
        }
        Ok((
            Segment::before(start, self.config.duration),
            Segment::after(end, self.config.duration),
        ))
    }

    /// Trend files covering `segment`
    pub fn locate(&self, segment: &Segment) -> Result<Vec<TrendFile>> {
        self.source.find_files(
            &self.config.observatory(),
            &self.config.frametype(),
            segment,
        )
    }

    /// Channels to compare between `start` and `end`
    pub fn discover_channels(&self, start: GpsTime, end: GpsTime) -> Result<Vec<Channel>> {
        let (before, after) = self.windows(start, end)?;
        let before_files = self.locate(&before)?;
        let after_files = self.locate(&after)?;
        self.select_channels(&before_files, &after_files)
    }

    /// Read `channels` over `segment`
    pub fn fetch(&self, channels: &[Channel], segment: &Segment) -> Result<HashMap<Channel, TimeSeries>> {
        let files = self.locate(segment)?;
        read_window(&files, channels, segment, self.config.nproc)
    }

    /// Compare every selected channel between `start` and `end`
    pub fn compare(&self, start: GpsTime, end: GpsTime) -> Result<Comparison> {
        let (before, after) = self.windows(start, end)?;
        log::info!(
            "Comparing {} trends before {} with after {} using {}",
            self.config.ifo,
            start,
            end,
            self.source.describe()
        );

        let before_files = self.locate(&before)?;
        let after_files = self.locate(&after)?;
        let channels = self.select_channels(&before_files, &after_files)?;

        let before_data = read_window(&before_files, &channels, &before, self.config.nproc)?;
        let after_data = read_window(&after_files, &channels, &after, self.config.nproc)?;

        let records = detect_changes(&before_data, &after_data)?;
        log::info!(
            "{} of {} channels changed",
            records.len(),
            channels.len()
        );

        Ok(Comparison {
            records,
            channels_examined: channels.len(),
            before,
            after,
        })
    }

    /// Channels present at both ends that pass the configured selection
    fn select_channels(&self, before_files: &[TrendFile], after_files: &[TrendFile]) -> Result<Vec<Channel>> {
        let (Some(first_before), Some(first_after)) = (before_files.first(), after_files.first()) else {
            return Err(ConlogError::NoChannels("no trend files to read channel names from".to_string()));
        };

        let before_names = formats::parser_for(&first_before.path)?.read_channel_names(&first_before.path)?;
        let after_names = formats::parser_for(&first_after.path)?.read_channel_names(&first_after.path)?;
        let available = available_channels(&before_names, &after_names);
        log::info!("{} channels available at both times", available.len());

        let selected = self.config.selection()?.apply(available);
        if selected.is_empty() {
            return Err(ConlogError::NoChannels(
                "no available channel passed the channel selection".to_string(),
            ));
        }

        log::info!("{} channels selected for comparison", selected.len());
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::CacheFile;
    use std::path::Path;

    fn empty_comparator() -> Comparator {
        let cache = CacheFile::parse(Path::new("empty.lcf"), "").unwrap();
        Comparator::new(Box::new(cache), ConlogConfig::new("H1"))
    }

    #[test]
    fn test_windows() {
        let comparator = empty_comparator();
        let (before, after) = comparator.windows(1000.0, 2000.0).unwrap();
        assert_eq!(before, Segment::new(940.0, 1000.0));
        assert_eq!(after, Segment::new(2000.0, 2060.0));
    }

    #[test]
    fn test_end_must_follow_start() {
        let comparator = empty_comparator();
        assert!(matches!(
            comparator.windows(2000.0, 1000.0),
            Err(ConlogError::InvalidInput(_))
        ));
        assert!(comparator.windows(1000.0, 1000.0).is_err());
    }

    #[test]
    fn test_compare_without_files() {
        let comparator = empty_comparator();
        assert!(matches!(
            comparator.compare(1000.0, 2000.0),
            Err(ConlogError::NoFilesFound { .. })
        ));
    }
}
