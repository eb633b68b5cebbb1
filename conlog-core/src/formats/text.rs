//! Delimited text trend files
//!
//! Layout:
//!
//! ```text
//! # comment lines are skipped
//! gps,H1:SYS-A.mean,H1:SYS-A.max
//! 1262304000,1.0,2.0
//! 1262304001,1.0,2.5
//! ```
//!
//! The first non-comment line is the header. Its first column names the GPS
//! time column, the others name channels. Rows must be uniformly spaced in
//! time; the spacing of the first two rows sets the sample rate, and a file
//! with a single row is taken to be a 1 Hz second trend.

use crate::formats::TrendFileParser;
use crate::timeseries::TimeSeries;
use crate::types::{Channel, ConlogError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Sample rate assumed for single-row files
const DEFAULT_SAMPLE_RATE: f64 = 1.0;

/// Relative tolerance on row spacing
const SPACING_TOLERANCE: f64 = 1e-6;

/// Column separator of a text trend file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `,` separated (`.csv`)
    Comma,
    /// Runs of spaces or tabs (`.txt`, `.dat`)
    Whitespace,
}

impl Delimiter {
    /// Split a line into cells; comma-separated cells may be quoted
    fn split(&self, line: &str) -> std::result::Result<Vec<String>, String> {
        match self {
            Delimiter::Comma => split_quoted(line),
            Delimiter::Whitespace => Ok(line.split_whitespace().map(str::to_string).collect()),
        }
    }
}

/// Split a comma-separated line, honouring `"quoted, cells"` and `""` escapes
fn split_quoted(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    // Length of the cell when its closing quote was seen
    let mut quoted_len: Option<usize> = None;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    let finish = |cell: String, quoted_len: Option<usize>| match quoted_len {
        Some(len) if !cell[len..].trim().is_empty() => {
            Err(format!("unexpected text after closing quote in {:?}", cell))
        }
        Some(len) => Ok(cell[..len].to_string()),
        None => Ok(cell.trim().to_string()),
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => {
                    in_quotes = false;
                    quoted_len = Some(cell.len());
                }
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' if quoted_len.is_none() && cell.trim().is_empty() => {
                cell.clear();
                in_quotes = true;
            }
            ',' => {
                cells.push(finish(std::mem::take(&mut cell), quoted_len.take())?);
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted cell".to_string());
    }
    cells.push(finish(cell, quoted_len)?);
    Ok(cells)
}

/// Parser for delimited text trend files
pub struct TextTrendParser {
    delimiter: Delimiter,
}

impl TextTrendParser {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Non-comment, non-blank lines with their 1-based line numbers
    fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
        text.lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
    }

    fn parse_header(&self, path: &Path, text: &str) -> Result<Vec<Channel>> {
        let (line_number, header) = Self::content_lines(text).next().ok_or_else(|| {
            ConlogError::TrendParseError {
                path: path.to_path_buf(),
                line: 0,
                reason: "file has no header".to_string(),
            }
        })?;

        let columns = self.delimiter.split(header).map_err(|reason| ConlogError::TrendParseError {
            path: path.to_path_buf(),
            line: line_number,
            reason,
        })?;
        if columns.len() < 2 {
            return Err(ConlogError::TrendParseError {
                path: path.to_path_buf(),
                line: line_number,
                reason: "header needs a GPS column and at least one channel".to_string(),
            });
        }

        Ok(columns.into_iter().skip(1).map(Channel::from).collect())
    }
}

impl TrendFileParser for TextTrendParser {
    fn read_channel_names(&self, path: &Path) -> Result<Vec<Channel>> {
        log::debug!("Reading channel names from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        self.parse_header(path, &text)
    }

    fn read(&self, path: &Path, channels: &[Channel]) -> Result<HashMap<Channel, TimeSeries>> {
        log::debug!("Reading {} channels from {:?}", channels.len(), path);
        let text = std::fs::read_to_string(path)?;
        let header = self.parse_header(path, &text)?;

        // Column index of every requested channel (column 0 is GPS time)
        let mut columns = Vec::with_capacity(channels.len());
        for channel in channels {
            let index = header
                .iter()
                .position(|name| name == channel)
                .ok_or_else(|| ConlogError::ChannelNotFound {
                    channel: channel.to_string(),
                    path: path.to_path_buf(),
                })?;
            columns.push(index + 1);
        }

        let parse_error = |line: usize, reason: String| ConlogError::TrendParseError {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut times: Vec<f64> = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); channels.len()];

        for (line_number, line) in Self::content_lines(&text).skip(1) {
            let cells = self
                .delimiter
                .split(line)
                .map_err(|reason| parse_error(line_number, reason))?;
            if cells.len() != header.len() + 1 {
                return Err(parse_error(
                    line_number,
                    format!("expected {} columns, found {}", header.len() + 1, cells.len()),
                ));
            }

            let time = cells[0]
                .parse::<f64>()
                .map_err(|e| parse_error(line_number, format!("bad GPS time {:?}: {}", cells[0], e)))?;
            if !time.is_finite() {
                return Err(parse_error(line_number, format!("GPS time {:?} is not finite", cells[0])));
            }

            if let Some(&previous) = times.last() {
                if time <= previous {
                    return Err(parse_error(line_number, format!("GPS time {} is not increasing", time)));
                }
                if let &[first, second, ..] = times.as_slice() {
                    let spacing = second - first;
                    let expected = first + spacing * times.len() as f64;
                    if (time - expected).abs() > SPACING_TOLERANCE * spacing {
                        return Err(parse_error(
                            line_number,
                            format!("irregular sampling: expected GPS {} found {}", expected, time),
                        ));
                    }
                }
            }
            times.push(time);

            for (samples, &column) in values.iter_mut().zip(&columns) {
                let cell = &cells[column];
                let value = cell
                    .parse::<f64>()
                    .map_err(|e| parse_error(line_number, format!("bad value {:?}: {}", cell, e)))?;
                samples.push(value);
            }
        }

        let Some(&t0) = times.first() else {
            return Err(parse_error(0, "file has no samples".to_string()));
        };
        let sample_rate = match times.get(1) {
            Some(&t1) => 1.0 / (t1 - t0),
            None => DEFAULT_SAMPLE_RATE,
        };

        Ok(channels
            .iter()
            .cloned()
            .zip(values)
            .map(|(channel, samples)| {
                let series = TimeSeries::new(channel.clone(), t0, sample_rate, samples);
                (channel, series)
            })
            .collect())
    }
}
