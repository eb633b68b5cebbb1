//! Report generation
//!
//! Writes the changed channels as CSV, a plain-text table, an HTML page or
//! JSON. Every format has the columns channel, initial_value, final_value
//! and difference; values use Rust's shortest round-trip float formatting.

use anyhow::{Context, Result};
use chrono::Utc;
use conlog_core::{gps_to_utc, ChangeRecord, Comparison, GpsTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column names shared by every format
const COLUMNS: [&str; 4] = ["channel", "initial_value", "final_value", "difference"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Txt,
    Html,
    Json,
}

impl ReportFormat {
    /// Guess the format from an output file extension (CSV if unknown)
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("txt") => ReportFormat::Txt,
            Some("html") | Some("htm") => ReportFormat::Html,
            Some("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// Everything a report shows
pub struct Report<'a> {
    pub ifo: &'a str,
    pub comparison: &'a Comparison,
}

/// Write a report to `path`
pub fn write_report_file(path: &Path, format: ReportFormat, report: &Report) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create report file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, format, report)
        .with_context(|| format!("Failed to write report file: {:?}", path))?;
    writer.flush()?;
    Ok(())
}

/// Write a report in `format`
pub fn write_report<W: Write>(writer: &mut W, format: ReportFormat, report: &Report) -> io::Result<()> {
    match format {
        ReportFormat::Csv => write_csv(writer, &report.comparison.records),
        ReportFormat::Txt => write_txt(writer, report),
        ReportFormat::Html => write_html(writer, report),
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &report.comparison.records)?;
            writeln!(writer)
        }
    }
}

fn row(record: &ChangeRecord) -> [String; 4] {
    [
        record.channel.to_string(),
        record.initial_value.to_string(),
        record.final_value.to_string(),
        record.difference.to_string(),
    ]
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_csv<W: Write>(writer: &mut W, records: &[ChangeRecord]) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join(","))?;
    for record in records {
        let fields: Vec<String> = row(record).iter().map(|f| csv_field(f)).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

/// GPS time with its UTC date, e.g. `1261872018 (2020-01-01 00:00:00 UTC)`
fn describe_time(gps: GpsTime) -> String {
    match gps_to_utc(gps) {
        Some(utc) => format!("{} ({})", gps, utc.format("%Y-%m-%d %H:%M:%S UTC")),
        None => gps.to_string(),
    }
}

fn write_txt<W: Write>(writer: &mut W, report: &Report) -> io::Result<()> {
    let comparison = report.comparison;
    writeln!(writer, "{} constant channel changes", report.ifo)?;
    writeln!(writer, "  Start: {}", describe_time(comparison.before.end))?;
    writeln!(writer, "  End:   {}", describe_time(comparison.after.start))?;
    writeln!(
        writer,
        "  Changed: {} of {} channels",
        comparison.records.len(),
        comparison.channels_examined
    )?;
    writeln!(writer)?;

    let rows: Vec<[String; 4]> = comparison.records.iter().map(row).collect();
    let mut widths = COLUMNS.map(str::len);
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 4]| {
        format!(
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3]
        )
    };

    writeln!(writer, "{}", line(COLUMNS).trim_end())?;
    writeln!(writer, "{}", "-".repeat(widths.iter().sum::<usize>() + 6))?;
    for cells in &rows {
        let cells = [&*cells[0], &*cells[1], &*cells[2], &*cells[3]];
        writeln!(writer, "{}", line(cells).trim_end())?;
    }
    Ok(())
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_html<W: Write>(writer: &mut W, report: &Report) -> io::Result<()> {
    let comparison = report.comparison;
    let title = format!("{} constant channel changes", html_escape(report.ifo));

    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(writer, "<title>{}</title>", title)?;
    writeln!(
        writer,
        "<style>table {{ border-collapse: collapse; }} th, td {{ border: 1px solid #ccc; padding: 4px 8px; }} td.num {{ text-align: right; font-family: monospace; }}</style>"
    )?;
    writeln!(writer, "</head>\n<body>")?;
    writeln!(writer, "<h1>{}</h1>", title)?;
    writeln!(
        writer,
        "<p>Start: {}<br>End: {}<br>Changed: {} of {} channels</p>",
        html_escape(&describe_time(comparison.before.end)),
        html_escape(&describe_time(comparison.after.start)),
        comparison.records.len(),
        comparison.channels_examined
    )?;

    writeln!(writer, "<table>")?;
    let header: Vec<String> = COLUMNS.iter().map(|c| format!("<th>{}</th>", c)).collect();
    writeln!(writer, "<tr>{}</tr>", header.concat())?;
    for record in &comparison.records {
        let [channel, initial, last, difference] = row(record);
        writeln!(
            writer,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            html_escape(&channel),
            initial,
            last,
            difference
        )?;
    }
    writeln!(writer, "</table>")?;
    writeln!(
        writer,
        "<p><small>Generated {} by gwdetchar-conlog {}</small></p>",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(writer, "</body>\n</html>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use conlog_core::{Channel, Segment};

    fn comparison(records: Vec<ChangeRecord>) -> Comparison {
        Comparison {
            channels_examined: 10,
            records,
            before: Segment::new(1_261_871_958.0, 1_261_872_018.0),
            after: Segment::new(1_261_958_418.0, 1_261_958_478.0),
        }
    }

    fn render(format: ReportFormat, records: Vec<ChangeRecord>) -> String {
        let comparison = comparison(records);
        let report = Report {
            ifo: "H1",
            comparison: &comparison,
        };
        let mut buffer = Vec::new();
        write_report(&mut buffer, format, &report).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn sample() -> Vec<ChangeRecord> {
        vec![
            ChangeRecord::new(Channel::from("H1:SYS-A.mean"), 4.0, 7.0),
            ChangeRecord::new(Channel::from("H1:SYS-B.mean"), 0.5, 0.75),
        ]
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReportFormat::from_path(Path::new("changes.csv")), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("changes.TXT")), ReportFormat::Txt);
        assert_eq!(ReportFormat::from_path(Path::new("out/changes.htm")), ReportFormat::Html);
        assert_eq!(ReportFormat::from_path(Path::new("changes.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("changes")), ReportFormat::Csv);
    }

    #[test]
    fn test_csv_output() {
        let csv = render(ReportFormat::Csv, sample());
        assert_eq!(
            csv,
            "channel,initial_value,final_value,difference\n\
             H1:SYS-A.mean,4,7,3\n\
             H1:SYS-B.mean,0.5,0.75,0.25\n"
        );
    }

    #[test]
    fn test_csv_empty_has_header() {
        assert_eq!(
            render(ReportFormat::Csv, vec![]),
            "channel,initial_value,final_value,difference\n"
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let records = vec![ChangeRecord::new(Channel::from("H1:SYS-A.mean,s-trend"), 1.0, 2.0)];
        let csv = render(ReportFormat::Csv, records);
        assert!(csv.contains("\"H1:SYS-A.mean,s-trend\",1,2,1"));
    }

    #[test]
    fn test_txt_table() {
        let txt = render(ReportFormat::Txt, sample());
        assert!(txt.starts_with("H1 constant channel changes\n"));
        assert!(txt.contains("2020-01-01 00:00:00 UTC"));
        assert!(txt.contains("Changed: 2 of 10 channels"));
        let last = txt.lines().last().unwrap();
        assert!(last.starts_with("H1:SYS-B.mean"));
        assert!(last.ends_with("0.25"));
    }

    #[test]
    fn test_html_escapes_names() {
        let records = vec![ChangeRecord::new(Channel::from("H1:<odd>&name"), 1.0, 2.0)];
        let html = render(ReportFormat::Html, records);
        assert!(html.contains("<td>H1:&lt;odd&gt;&amp;name</td>"));
        assert!(html.contains("<th>initial_value</th>"));
    }

    #[test]
    fn test_json_records() {
        let json = render(ReportFormat::Json, sample());
        let parsed: Vec<ChangeRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_write_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.csv");
        let comparison = comparison(sample());
        let report = Report {
            ifo: "H1",
            comparison: &comparison,
        };
        write_report_file(&path, ReportFormat::Csv, &report).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
