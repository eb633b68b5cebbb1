//! Change detection
//!
//! Compares a reference window ending at the start time with a comparison
//! window beginning at the end time. A channel is reported only when it held
//! one exact value for the whole reference window and the first sample after
//! the boundary differs from it. Channels that vary during the reference
//! window are continuously changing quantities rather than switched states
//! and are skipped.
//!
//! All comparisons are exact IEEE-754 comparisons: no tolerance is applied.

use crate::timeseries::TimeSeries;
use crate::types::{ChangeRecord, Channel, ConlogError, Result};
use std::collections::HashMap;

/// Consecutive differences `values[i + 1] - values[i]`
pub fn first_difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// True if no consecutive difference is non-zero
///
/// A single sample is constant. A NaN difference counts as non-zero.
pub fn is_constant(values: &[f64]) -> bool {
    first_difference(values).iter().all(|diff| *diff == 0.0)
}

/// Find the channels that changed value across the comparison boundary
///
/// # Arguments
/// * `before` - Reference window per channel (ends at the start time)
/// * `after` - Comparison window per channel (begins at the end time)
///
/// # Returns
/// * One `ChangeRecord` per changed channel, sorted by channel name
/// * `ConlogError::InvalidInput` if the two maps hold different channels or
///   any series is empty
pub fn detect_changes(
    before: &HashMap<Channel, TimeSeries>,
    after: &HashMap<Channel, TimeSeries>,
) -> Result<Vec<ChangeRecord>> {
    validate(before, after)?;

    let mut channels: Vec<&Channel> = before.keys().collect();
    channels.sort();

    let mut records = Vec::new();
    for channel in channels {
        let reference = &before[channel].values;
        let comparison = &after[channel].values;

        if !is_constant(reference) {
            log::trace!("{} varies during the reference window, skipping", channel);
            continue;
        }

        // `validate` rejects empty series
        let initial = reference[reference.len() - 1];
        let last = comparison[0];
        if initial == last {
            continue;
        }

        log::debug!("{} changed from {} to {}", channel, initial, last);
        records.push(ChangeRecord::new(channel.clone(), initial, last));
    }

    Ok(records)
}

/// Check that both windows cover the same non-empty channels
fn validate(
    before: &HashMap<Channel, TimeSeries>,
    after: &HashMap<Channel, TimeSeries>,
) -> Result<()> {
    if let Some(channel) = before.keys().find(|channel| !after.contains_key(*channel)) {
        return Err(ConlogError::InvalidInput(format!(
            "{} is missing from the comparison window",
            channel
        )));
    }
    if let Some(channel) = after.keys().find(|channel| !before.contains_key(*channel)) {
        return Err(ConlogError::InvalidInput(format!(
            "{} is missing from the reference window",
            channel
        )));
    }
    for (window, series) in [("reference", before), ("comparison", after)] {
        if let Some(channel) = series
            .iter()
            .find(|(_, ts)| ts.is_empty())
            .map(|(channel, _)| channel)
        {
            return Err(ConlogError::InvalidInput(format!(
                "{} has no samples in the {} window",
                channel, window
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(data: &[(&str, Vec<f64>)], t0: f64) -> HashMap<Channel, TimeSeries> {
        data.iter()
            .map(|(name, values)| {
                let channel = Channel::from(*name);
                (channel.clone(), TimeSeries::new(channel, t0, 1.0, values.clone()))
            })
            .collect()
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(&[1.0, 3.0, 2.0]), vec![2.0, -1.0]);
        assert!(first_difference(&[5.0]).is_empty());
        assert!(first_difference(&[]).is_empty());
    }

    #[test]
    fn test_is_constant() {
        assert!(is_constant(&[4.0, 4.0, 4.0]));
        assert!(is_constant(&[9.0]));
        assert!(!is_constant(&[2.0, 3.0, 2.0]));
        assert!(!is_constant(&[1.0, f64::NAN, 1.0]));
        assert!(!is_constant(&[f64::INFINITY, f64::INFINITY]));
    }

    #[test]
    fn test_unchanged_and_varying_channels_excluded() {
        let before = window(&[("A", vec![1.0, 1.0, 1.0]), ("B", vec![2.0, 3.0, 2.0])], 0.0);
        let after = window(&[("A", vec![1.0, 8.0]), ("B", vec![5.0, 5.0])], 100.0);

        let records = detect_changes(&before, &after).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_changed_channel_reported() {
        let before = window(&[("C", vec![4.0, 4.0, 4.0])], 0.0);
        let after = window(&[("C", vec![7.0, 7.0])], 100.0);

        let records = detect_changes(&before, &after).unwrap();
        assert_eq!(records, vec![ChangeRecord::new(Channel::from("C"), 4.0, 7.0)]);
        assert_eq!(records[0].difference, 3.0);
    }

    #[test]
    fn test_single_sample_reference_is_constant() {
        let before = window(&[("D", vec![9.0])], 0.0);
        let after = window(&[("D", vec![10.5])], 100.0);

        let records = detect_changes(&before, &after).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].initial_value, 9.0);
        assert_eq!(records[0].final_value, 10.5);
    }

    #[test]
    fn test_exact_comparison_no_tolerance() {
        let before = window(&[("E", vec![0.1 + 0.2, 0.1 + 0.2])], 0.0);
        let after = window(&[("E", vec![0.3])], 100.0);

        let records = detect_changes(&before, &after).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].difference, 0.3 - (0.1 + 0.2));
    }

    #[test]
    fn test_only_boundary_samples_matter() {
        // Later samples of the comparison window are ignored
        let before = window(&[("F", vec![1.0, 1.0])], 0.0);
        let after = window(&[("F", vec![1.0, 2.0, 3.0])], 100.0);
        assert!(detect_changes(&before, &after).unwrap().is_empty());
    }

    #[test]
    fn test_nan_boundary_is_a_change() {
        let before = window(&[("G", vec![1.0, 1.0])], 0.0);
        let after = window(&[("G", vec![f64::NAN])], 100.0);

        let records = detect_changes(&before, &after).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].difference.is_nan());
    }

    #[test]
    fn test_output_sorted_by_channel() {
        let names = ["H1:Z.mean", "H1:A.mean", "H1:M.mean", "H1:B.mean"];
        let before_data: Vec<_> = names.iter().map(|n| (*n, vec![0.0, 0.0])).collect();
        let after_data: Vec<_> = names.iter().map(|n| (*n, vec![1.0])).collect();

        let records = detect_changes(&window(&before_data, 0.0), &window(&after_data, 100.0)).unwrap();
        let order: Vec<&str> = records.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(order, vec!["H1:A.mean", "H1:B.mean", "H1:M.mean", "H1:Z.mean"]);
    }

    #[test]
    fn test_idempotent() {
        let before = window(&[("A", vec![1.0, 1.0]), ("C", vec![4.0, 4.0])], 0.0);
        let after = window(&[("A", vec![2.0]), ("C", vec![4.0])], 100.0);

        let first = detect_changes(&before, &after).unwrap();
        let second = detect_changes(&before, &after).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let records = detect_changes(&HashMap::new(), &HashMap::new()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_mismatched_channels_rejected() {
        let before = window(&[("A", vec![1.0])], 0.0);
        let after = window(&[("B", vec![1.0])], 100.0);
        assert!(matches!(
            detect_changes(&before, &after),
            Err(ConlogError::InvalidInput(_))
        ));

        let after = window(&[("A", vec![1.0]), ("B", vec![1.0])], 100.0);
        assert!(matches!(
            detect_changes(&before, &after),
            Err(ConlogError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let before = window(&[("A", vec![])], 0.0);
        let after = window(&[("A", vec![1.0])], 100.0);
        assert!(matches!(
            detect_changes(&before, &after),
            Err(ConlogError::InvalidInput(_))
        ));

        let before = window(&[("A", vec![1.0])], 0.0);
        let after = window(&[("A", vec![])], 100.0);
        assert!(detect_changes(&before, &after).is_err());
    }
}
