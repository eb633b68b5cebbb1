//! Channel discovery and selection
//!
//! The channel universe of a comparison is the set of channels present at
//! both ends, narrowed by trend statistic, an optional channel-list file and
//! optional regular expressions.

use crate::types::{Channel, ConlogError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

/// Read a channel-list file
///
/// One channel per line; blank lines and `#` comments are skipped and only
/// the first whitespace-separated token of each line is used.
pub fn read_channel_list(path: &Path) -> Result<Vec<Channel>> {
    log::info!("Reading channel list: {:?}", path);
    let content = std::fs::read_to_string(path).map_err(|e| ConlogError::ChannelListError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let channels: Vec<Channel> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(Channel::from)
        .collect();

    if channels.is_empty() {
        return Err(ConlogError::ChannelListError {
            path: path.to_path_buf(),
            reason: "file lists no channels".to_string(),
        });
    }

    log::debug!("Channel list {:?} names {} channels", path, channels.len());
    Ok(channels)
}

/// Channels present in both lists, sorted
pub fn available_channels(before: &[Channel], after: &[Channel]) -> Vec<Channel> {
    let after: BTreeSet<&Channel> = after.iter().collect();
    before
        .iter()
        .filter(|channel| after.contains(channel))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Filters narrowing the discovered channels
#[derive(Debug, Clone, Default)]
pub struct ChannelSelection {
    /// Keep only channels with this trend statistic (e.g. `mean`)
    statistic: Option<String>,
    /// Keep only channels named in this list
    channel_list: Option<BTreeSet<Channel>>,
    /// Keep only channels matching at least one pattern
    patterns: Vec<Regex>,
}

impl ChannelSelection {
    /// Selection that keeps every channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: restrict to a trend statistic
    pub fn with_statistic(mut self, statistic: Option<&str>) -> Self {
        self.statistic = statistic.map(str::to_string);
        self
    }

    /// Builder method: restrict to the channels of a list
    pub fn with_channel_list(mut self, channels: Vec<Channel>) -> Self {
        self.channel_list = Some(channels.into_iter().collect());
        self
    }

    /// Builder method: restrict to channels matching any of `patterns`
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.patterns.push(Regex::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Check if a channel passes every filter
    pub fn accepts(&self, channel: &Channel) -> bool {
        if let Some(statistic) = &self.statistic {
            if channel.trend_statistic() != Some(statistic.as_str()) {
                return false;
            }
        }
        if let Some(list) = &self.channel_list {
            if !list.contains(channel) {
                return false;
            }
        }
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|pattern| pattern.is_match(channel.as_str()))
    }

    /// Accepted channels, sorted and de-duplicated
    pub fn apply<I>(&self, channels: I) -> Vec<Channel>
    where
        I: IntoIterator<Item = Channel>,
    {
        channels
            .into_iter()
            .filter(|channel| self.accepts(channel))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(names: &[&str]) -> Vec<Channel> {
        names.iter().map(|n| Channel::from(*n)).collect()
    }

    #[test]
    fn test_available_channels_intersection() {
        let before = channels(&["H1:C.mean", "H1:A.mean", "H1:B.mean"]);
        let after = channels(&["H1:B.mean", "H1:C.mean", "H1:D.mean"]);
        assert_eq!(
            available_channels(&before, &after),
            channels(&["H1:B.mean", "H1:C.mean"])
        );
    }

    #[test]
    fn test_statistic_filter() {
        let selection = ChannelSelection::new().with_statistic(Some("mean"));
        let kept = selection.apply(channels(&[
            "H1:A.mean",
            "H1:A.max",
            "H1:B.mean,s-trend",
            "H1:NOSTAT",
        ]));
        assert_eq!(kept, channels(&["H1:A.mean", "H1:B.mean,s-trend"]));
    }

    #[test]
    fn test_channel_list_filter() {
        let selection = ChannelSelection::new().with_channel_list(channels(&["H1:B.mean"]));
        assert_eq!(
            selection.apply(channels(&["H1:A.mean", "H1:B.mean"])),
            channels(&["H1:B.mean"])
        );
    }

    #[test]
    fn test_pattern_filter_any_match() {
        let selection = ChannelSelection::new()
            .with_patterns(["^H1:SUS-", "ISI"])
            .unwrap();
        let kept = selection.apply(channels(&[
            "H1:SUS-ETMX.mean",
            "H1:HPI-ISI_X.mean",
            "H1:PSL-PWR.mean",
        ]));
        assert_eq!(kept, channels(&["H1:HPI-ISI_X.mean", "H1:SUS-ETMX.mean"]));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ChannelSelection::new().with_patterns(["(unclosed"]);
        assert!(matches!(result, Err(ConlogError::InvalidPattern(_))));
    }

    #[test]
    fn test_apply_sorts_and_dedups() {
        let selection = ChannelSelection::new();
        assert_eq!(
            selection.apply(channels(&["B", "A", "B"])),
            channels(&["A", "B"])
        );
    }

    #[test]
    fn test_read_channel_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        std::fs::write(
            &path,
            "# constant channels\nH1:A.mean\n\n  H1:B.mean  16\n#H1:C.mean\n",
        )
        .unwrap();

        let list = read_channel_list(&path).unwrap();
        assert_eq!(list, channels(&["H1:A.mean", "H1:B.mean"]));
    }

    #[test]
    fn test_read_channel_list_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            read_channel_list(&missing),
            Err(ConlogError::ChannelListError { .. })
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "# nothing\n").unwrap();
        assert!(read_channel_list(&empty).is_err());
    }
}
