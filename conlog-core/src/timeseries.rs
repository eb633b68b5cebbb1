//! Regularly sampled channel data
//!
//! A `TimeSeries` holds the samples of one channel over a contiguous span.
//! The window reader builds one per channel per comparison window by cropping
//! and concatenating the series read from each trend file.

use crate::types::{Channel, ConlogError, GpsTime, Result, Segment};

/// Fraction of a sample period tolerated when aligning sample times
const ALIGNMENT_TOLERANCE: f64 = 1e-6;

/// Samples of a single channel at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Channel the samples belong to
    pub channel: Channel,
    /// GPS time of the first sample
    pub t0: GpsTime,
    /// Samples per second
    pub sample_rate: f64,
    /// Sample values in time order
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(channel: Channel, t0: GpsTime, sample_rate: f64, values: Vec<f64>) -> Self {
        Self {
            channel,
            t0,
            sample_rate,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample period in seconds
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Segment covered by the samples, `[t0, t0 + len * dt)`
    pub fn span(&self) -> Segment {
        Segment::new(self.t0, self.t0 + self.len() as f64 * self.dt())
    }

    /// GPS time of every sample
    pub fn times(&self) -> impl Iterator<Item = GpsTime> + '_ {
        let dt = self.dt();
        (0..self.len()).map(move |index| self.t0 + index as f64 * dt)
    }

    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Keep only the samples whose time lies in `segment`
    pub fn crop(&self, segment: &Segment) -> TimeSeries {
        let first = self.index_at(segment.start);
        let last = self.index_at(segment.end).max(first);

        TimeSeries {
            channel: self.channel.clone(),
            t0: self.t0 + first as f64 * self.dt(),
            sample_rate: self.sample_rate,
            values: self.values[first..last].to_vec(),
        }
    }

    /// Index of the first sample at or after `time`, clamped to the series
    fn index_at(&self, time: GpsTime) -> usize {
        let offset = (time - self.t0) * self.sample_rate;
        if offset <= 0.0 {
            return 0;
        }
        let index = (offset - ALIGNMENT_TOLERANCE).ceil() as usize;
        index.min(self.len())
    }

    /// Extend this series with the samples of `other`
    ///
    /// `other` must have the same rate and start where this series ends.
    /// Samples of `other` that fall inside this series (overlapping files)
    /// are dropped.
    pub fn append(&mut self, other: TimeSeries) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }

        if (self.sample_rate - other.sample_rate).abs() > ALIGNMENT_TOLERANCE * self.sample_rate {
            return Err(ConlogError::DataGap {
                channel: self.channel.to_string(),
                reason: format!(
                    "sample rate changes from {} Hz to {} Hz",
                    self.sample_rate, other.sample_rate
                ),
            });
        }

        let end = self.span().end;
        let gap = (other.t0 - end) * self.sample_rate;
        if gap > ALIGNMENT_TOLERANCE {
            return Err(ConlogError::DataGap {
                channel: self.channel.to_string(),
                reason: format!("missing data between {} and {}", end, other.t0),
            });
        }

        let skip = other.index_at(end);
        if skip > 0 {
            log::debug!(
                "Dropping {} overlapping samples of {} at {}",
                skip,
                self.channel,
                other.t0
            );
        }
        self.values.extend_from_slice(&other.values[skip..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(t0: GpsTime, values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(Channel::from("H1:TEST.mean"), t0, 1.0, values)
    }

    #[test]
    fn test_span_and_times() {
        let ts = series(100.0, vec![1.0, 2.0, 3.0]);
        assert_eq!(ts.span(), Segment::new(100.0, 103.0));
        assert_eq!(ts.times().collect::<Vec<_>>(), vec![100.0, 101.0, 102.0]);
        assert_eq!(ts.first(), Some(1.0));
        assert_eq!(ts.last(), Some(3.0));
    }

    #[test]
    fn test_crop_inside() {
        let ts = series(100.0, (0..10).map(f64::from).collect());
        let cropped = ts.crop(&Segment::new(102.0, 105.0));
        assert_eq!(cropped.t0, 102.0);
        assert_eq!(cropped.values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_crop_unaligned_start() {
        let ts = series(100.0, (0..10).map(f64::from).collect());
        let cropped = ts.crop(&Segment::new(101.5, 104.0));
        assert_eq!(cropped.t0, 102.0);
        assert_eq!(cropped.values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_crop_outside() {
        let ts = series(100.0, vec![1.0, 2.0]);
        assert!(ts.crop(&Segment::new(200.0, 300.0)).is_empty());
        assert!(ts.crop(&Segment::new(0.0, 50.0)).is_empty());
    }

    #[test]
    fn test_append_contiguous() {
        let mut ts = series(100.0, vec![1.0, 2.0]);
        ts.append(series(102.0, vec![3.0])).unwrap();
        assert_eq!(ts.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(ts.span().end, 103.0);
    }

    #[test]
    fn test_append_overlapping_drops_duplicates() {
        let mut ts = series(100.0, vec![1.0, 2.0, 3.0]);
        ts.append(series(101.0, vec![2.0, 3.0, 4.0])).unwrap();
        assert_eq!(ts.values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append_gap_is_error() {
        let mut ts = series(100.0, vec![1.0, 2.0]);
        let result = ts.append(series(110.0, vec![3.0]));
        assert!(matches!(result, Err(ConlogError::DataGap { .. })));
    }

    #[test]
    fn test_append_rate_change_is_error() {
        let mut ts = series(100.0, vec![1.0, 2.0]);
        let other = TimeSeries::new(Channel::from("H1:TEST.mean"), 102.0, 16.0, vec![3.0]);
        assert!(ts.append(other).is_err());
    }
}
