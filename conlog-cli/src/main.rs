//! gwdetchar-conlog CLI Application
//!
//! Command-line front end for the conlog-core library. It adds:
//! - GPS or UTC time parsing for the two comparison times
//! - TOML configuration with command-line overrides
//! - Report generation (CSV/TXT/HTML/JSON)

use anyhow::{Context, Result};
use clap::Parser;
use conlog_core::{parse_gps, Comparator};
use std::path::PathBuf;

mod config;
mod report;

use config::{load_config, AppConfig};
use report::{write_report_file, Report, ReportFormat};

/// Find constant channels that changed value between two times
#[derive(Parser, Debug)]
#[command(name = "gwdetchar-conlog")]
#[command(about = "Compare constant trend channels between two GPS times", long_about = None)]
#[command(version)]
struct Args {
    /// Interferometer prefix (e.g. H1)
    #[arg(value_name = "IFO")]
    ifo: String,

    /// Start time (GPS seconds or UTC date)
    #[arg(value_name = "START")]
    start: String,

    /// End time (GPS seconds or UTC date)
    #[arg(value_name = "END")]
    end: String,

    /// Output report file (default: changes.csv)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format (default: from the output extension)
    #[arg(long, value_enum, value_name = "FMT")]
    format: Option<ReportFormat>,

    /// Trend frame type (default: IFO_T)
    #[arg(short, long, value_name = "FRAMETYPE")]
    frametype: Option<String>,

    /// Directory searched recursively for trend files
    #[arg(long, value_name = "DIR", conflicts_with = "cache")]
    archive: Option<PathBuf>,

    /// LAL cache file listing trend files
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// File listing the channels to compare, one per line
    #[arg(short, long = "channel-list", value_name = "FILE")]
    channel_list: Option<PathBuf>,

    /// Only compare channels matching this regular expression (can be repeated)
    #[arg(short = 's', long = "select", value_name = "REGEX")]
    select: Vec<String>,

    /// Length of each comparison window in seconds (default: 60)
    #[arg(short, long, value_name = "SECONDS")]
    duration: Option<f64>,

    /// Trend statistic to compare (default: mean)
    #[arg(long, value_name = "NAME", conflicts_with = "all_statistics")]
    statistic: Option<String>,

    /// Compare every trend statistic
    #[arg(long)]
    all_statistics: bool,

    /// Number of trend files to read in parallel (default: 1)
    #[arg(short = 'j', long, value_name = "NPROC")]
    nproc: Option<usize>,

    /// Path to configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Command-line settings in configuration form
    fn overrides(&self) -> AppConfig {
        let mut overrides = AppConfig::default();
        overrides.data.archive = self.archive.clone();
        overrides.data.cache = self.cache.clone();
        overrides.data.frametype = self.frametype.clone();
        overrides.selection.channel_list = self.channel_list.clone();
        overrides.selection.patterns = self.select.clone();
        overrides.selection.statistic = self.statistic.clone();
        overrides.selection.all_statistics = self.all_statistics;
        overrides.compare.duration = self.duration;
        overrides.compare.nproc = self.nproc;
        overrides.output.path = self.output.clone();
        overrides.output.format = self.format;
        overrides
    }
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("gwdetchar-conlog v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using conlog-core v{}", conlog_core::VERSION);

    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Compare the two times and write the report
fn run(args: &Args) -> Result<()> {
    let start = parse_gps(&args.start).with_context(|| format!("Invalid start time: {}", args.start))?;
    let end = parse_gps(&args.end).with_context(|| format!("Invalid end time: {}", args.end))?;

    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            load_config(path)?
        }
        None => AppConfig::default(),
    };
    app_config.merge(args.overrides());

    let settings = app_config.resolve(&args.ifo)?;
    log::debug!("Resolved settings: {:?}", settings);

    let source = settings.source.open()?;
    let comparator = Comparator::new(source, settings.config);
    let comparison = comparator
        .compare(start, end)
        .with_context(|| format!("Failed to compare {} between {} and {}", args.ifo, start, end))?;

    let report = Report {
        ifo: &args.ifo,
        comparison: &comparison,
    };
    write_report_file(&settings.output, settings.format, &report)?;

    log::info!(
        "{} changed channels written to {:?}",
        comparison.records.len(),
        settings.output
    );
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "gwdetchar-conlog",
            "H1",
            "1262304018",
            "2020-01-02",
            "--archive",
            "/data/trend",
            "-s",
            "^H1:SUS-",
            "-s",
            "^H1:PSL-",
            "-j",
            "4",
            "--format",
            "html",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.ifo, "H1");
        assert_eq!(args.select.len(), 2);
        assert_eq!(args.verbose, 2);

        let overrides = args.overrides();
        assert_eq!(overrides.data.archive, Some(PathBuf::from("/data/trend")));
        assert_eq!(overrides.compare.nproc, Some(4));
        assert_eq!(overrides.output.format, Some(ReportFormat::Html));
    }

    #[test]
    fn test_conflicting_arguments() {
        let both_sources = Args::try_parse_from([
            "gwdetchar-conlog", "H1", "1", "2", "--archive", "a", "--cache", "c",
        ]);
        assert!(both_sources.is_err());

        let both_statistics = Args::try_parse_from([
            "gwdetchar-conlog", "H1", "1", "2", "--statistic", "max", "--all-statistics",
        ]);
        assert!(both_statistics.is_err());
    }
}
