//! Trend file discovery
//!
//! Trend files follow the frame naming convention
//! `{OBSERVATORY}-{FRAMETYPE}-{GPSSTART}-{DURATION}.{ext}`, e.g.
//! `H-H1_T-1262304000-3600.csv`. A `TrendSource` answers "which files hold
//! data of this frametype for this segment"; files can be found by walking a
//! directory tree or by reading a LAL cache file.

use crate::formats;
use crate::types::{ConlogError, GpsTime, Result, Segment};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A trend file located on disk
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFile {
    /// Single-letter observatory code (e.g. `H`, `L`)
    pub observatory: String,
    /// Frame type tag (e.g. `H1_T` for second trends)
    pub frametype: String,
    /// GPS span covered by the file
    pub segment: Segment,
    /// Location on disk
    pub path: PathBuf,
}

/// Parse a trend file name following the frame naming convention
///
/// Returns `None` if the name does not match or the extension has no parser.
pub fn parse_trend_file_name(path: &Path) -> Option<TrendFile> {
    if !formats::is_supported(path) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;

    let mut parts = stem.rsplitn(3, '-');
    let duration: f64 = parts.next()?.parse().ok()?;
    let start: GpsTime = parts.next()?.parse().ok()?;
    let (observatory, frametype) = parts.next()?.split_once('-')?;

    if observatory.is_empty() || frametype.is_empty() || !(duration > 0.0) {
        return None;
    }

    Some(TrendFile {
        observatory: observatory.to_string(),
        frametype: frametype.to_string(),
        segment: Segment::new(start, start + duration),
        path: path.to_path_buf(),
    })
}

/// Default second-trend frame type for an interferometer, e.g. `H1` -> `H1_T`
pub fn default_frametype(ifo: &str) -> String {
    format!("{}_T", ifo)
}

/// Observatory code of an interferometer, e.g. `H1` -> `H`
pub fn observatory_of(ifo: &str) -> String {
    ifo.chars().take(1).collect()
}

/// Something that can locate trend files
pub trait TrendSource: Send + Sync {
    /// Files of `frametype` from `observatory` that intersect `segment`,
    /// sorted by start time
    fn find_files(&self, observatory: &str, frametype: &str, segment: &Segment)
        -> Result<Vec<TrendFile>>;

    /// Short human-readable description for logging
    fn describe(&self) -> String;
}

/// Keep matching files, sorted by start time without duplicate paths
fn select_files(
    candidates: impl IntoIterator<Item = TrendFile>,
    observatory: &str,
    frametype: &str,
    segment: &Segment,
) -> Result<Vec<TrendFile>> {
    let mut seen = HashSet::new();
    let mut files: Vec<TrendFile> = candidates
        .into_iter()
        .filter(|file| {
            file.observatory == observatory
                && file.frametype == frametype
                && file.segment.intersects(segment)
        })
        .filter(|file| seen.insert(file.path.clone()))
        .collect();

    if files.is_empty() {
        return Err(ConlogError::NoFilesFound {
            observatory: observatory.to_string(),
            frametype: frametype.to_string(),
            start: segment.start,
            end: segment.end,
        });
    }

    files.sort_by(|a, b| {
        a.segment
            .start
            .total_cmp(&b.segment.start)
            .then_with(|| a.path.cmp(&b.path))
    });
    log::debug!(
        "Found {} {} files for {}",
        files.len(),
        frametype,
        segment
    );
    Ok(files)
}

/// Trend files found by walking a directory tree
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every correctly named trend file below the root
    pub fn scan(&self) -> Result<Vec<TrendFile>> {
        if !self.root.is_dir() {
            return Err(ConlogError::InvalidInput(format!(
                "trend archive {:?} is not a directory",
                self.root
            )));
        }
        let mut files = Vec::new();
        Self::walk(&self.root, &mut files)?;
        Ok(files)
    }

    fn walk(dir: &Path, files: &mut Vec<TrendFile>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            // Symlinked directories are not followed
            if entry.file_type()?.is_dir() {
                Self::walk(&path, files)?;
            } else if let Some(file) = parse_trend_file_name(&path) {
                files.push(file);
            } else {
                log::trace!("Ignoring {:?}", path);
            }
        }
        Ok(())
    }
}

impl TrendSource for DirectoryArchive {
    fn find_files(
        &self,
        observatory: &str,
        frametype: &str,
        segment: &Segment,
    ) -> Result<Vec<TrendFile>> {
        select_files(self.scan()?, observatory, frametype, segment)
    }

    fn describe(&self) -> String {
        format!("archive {:?}", self.root)
    }
}

/// Trend files listed in a LAL cache file
///
/// Each line reads `OBS FRAMETYPE GPSSTART DURATION URL`, where the URL is a
/// plain path or a `file://` URL.
#[derive(Debug)]
pub struct CacheFile {
    path: PathBuf,
    entries: Vec<TrendFile>,
}

impl CacheFile {
    /// Read and parse a cache file
    pub fn read(path: &Path) -> Result<Self> {
        log::info!("Reading cache file: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse cache `content`; `path` is used for error messages
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let error = |reason: String| ConlogError::CacheParseError {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[observatory, frametype, start, duration, url] = fields.as_slice() else {
                return Err(error(format!("expected 5 fields, found {}", fields.len())));
            };
            let start: GpsTime = start
                .parse()
                .map_err(|_| error(format!("bad GPS start {:?}", start)))?;
            let duration: f64 = duration
                .parse()
                .map_err(|_| error(format!("bad duration {:?}", duration)))?;

            entries.push(TrendFile {
                observatory: observatory.to_string(),
                frametype: frametype.to_string(),
                segment: Segment::new(start, start + duration),
                path: url_to_path(url),
            });
        }

        log::debug!("Cache {:?} lists {} files", path, entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &[TrendFile] {
        &self.entries
    }
}

impl TrendSource for CacheFile {
    fn find_files(
        &self,
        observatory: &str,
        frametype: &str,
        segment: &Segment,
    ) -> Result<Vec<TrendFile>> {
        select_files(self.entries.iter().cloned(), observatory, frametype, segment)
    }

    fn describe(&self) -> String {
        format!("cache {:?}", self.path)
    }
}

/// Strip a `file://` or `file://localhost` prefix
fn url_to_path(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("file://localhost")
        .or_else(|| url.strip_prefix("file://"))
        .unwrap_or(url);
    PathBuf::from(path)
}
