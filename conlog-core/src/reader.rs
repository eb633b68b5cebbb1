//! Window reader
//!
//! Reads a set of channels over one comparison window from the trend files
//! that cover it. Files may be read on a rayon pool; the per-file results are
//! merged in time order once every read has finished.

use crate::archive::TrendFile;
use crate::formats;
use crate::timeseries::TimeSeries;
use crate::types::{Channel, ConlogError, Result, Segment};
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Read `channels` over `segment` from `files`
///
/// # Arguments
/// * `files` - Trend files covering the segment, sorted by start time
/// * `channels` - Channels to read
/// * `segment` - Window to keep
/// * `nproc` - Number of files read concurrently (1 reads serially)
///
/// # Returns
/// * One contiguous `TimeSeries` per channel covering the whole segment
/// * `ConlogError::DataGap` if a channel has missing or no data in the segment
pub fn read_window(
    files: &[TrendFile],
    channels: &[Channel],
    segment: &Segment,
    nproc: usize,
) -> Result<HashMap<Channel, TimeSeries>> {
    log::info!(
        "Reading {} channels for {} from {} files",
        channels.len(),
        segment,
        files.len()
    );

    let reads: Vec<Result<HashMap<Channel, TimeSeries>>> = if nproc > 1 && files.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nproc)
            .build()
            .map_err(|e| ConlogError::InvalidInput(format!("cannot start {} readers: {}", nproc, e)))?;
        pool.install(|| {
            files
                .par_iter()
                .map(|file| read_file(file, channels, segment))
                .collect()
        })
    } else {
        files
            .iter()
            .map(|file| read_file(file, channels, segment))
            .collect()
    };

    let mut data: HashMap<Channel, TimeSeries> = HashMap::with_capacity(channels.len());
    for read in reads {
        for (channel, series) in read? {
            match data.entry(channel) {
                Entry::Occupied(mut existing) => existing.get_mut().append(series)?,
                Entry::Vacant(slot) => {
                    slot.insert(series);
                }
            }
        }
    }

    for channel in channels {
        check_coverage(channel, data.get(channel), segment)?;
    }

    Ok(data)
}

/// Read one file and crop it to the segment
fn read_file(
    file: &TrendFile,
    channels: &[Channel],
    segment: &Segment,
) -> Result<HashMap<Channel, TimeSeries>> {
    let parser = formats::parser_for(&file.path)?;
    let data = parser.read(&file.path, channels)?;

    Ok(data
        .into_iter()
        .map(|(channel, series)| (channel, series.crop(segment)))
        .filter(|(_, series)| !series.is_empty())
        .collect())
}

/// Check that a channel's merged series spans the segment to within a sample
fn check_coverage(channel: &Channel, series: Option<&TimeSeries>, segment: &Segment) -> Result<()> {
    let gap = |reason: String| ConlogError::DataGap {
        channel: channel.to_string(),
        reason,
    };

    let series = series
        .filter(|series| !series.is_empty())
        .ok_or_else(|| gap(format!("no samples in {}", segment)))?;

    let span = series.span();
    let dt = series.dt();
    if span.start - segment.start >= dt {
        return Err(gap(format!("data starts at {}, window starts at {}", span.start, segment.start)));
    }
    if segment.end - span.end >= dt {
        return Err(gap(format!("data ends at {}, window ends at {}", span.end, segment.end)));
    }
    Ok(())
}
