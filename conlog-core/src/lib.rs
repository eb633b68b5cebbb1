//! Constant-channel comparison library
//!
//! Finds detector auxiliary channels whose second-trend value changed between
//! two GPS times.
//!
//! # Architecture
//!
//! A comparison runs in a straight line:
//! - Locate the trend files around both times (directory archive or LAL cache)
//! - Read channel names from both ends and keep the common, selected ones
//! - Read a short window ending at the start time and one beginning at the end time
//! - Report channels that were constant before the start and differ after the end
//!
//! The library does NOT:
//! - Parse GWF frame files (trend data is read from delimited text files)
//! - Query remote data-find services
//! - Write reports (see the `gwdetchar-conlog` binary)
//!
//! # Example Usage
//!
//! ```no_run
//! use conlog_core::{Comparator, ConlogConfig, DirectoryArchive};
//!
//! let config = ConlogConfig::new("H1")
//!     .with_duration(60.0)
//!     .add_pattern("^H1:SUS-");
//!
//! let comparator = Comparator::new(Box::new(DirectoryArchive::new("/data/trend")), config);
//! let comparison = comparator.compare(1262304018.0, 1262390418.0).unwrap();
//!
//! for record in &comparison.records {
//!     println!(
//!         "{}: {} -> {} ({:+})",
//!         record.channel, record.initial_value, record.final_value, record.difference
//!     );
//! }
//! ```

// Public modules
pub mod archive;
pub mod channels;
pub mod comparator;
pub mod config;
pub mod detector;
pub mod formats;
pub mod reader;
pub mod time;
pub mod timeseries;
pub mod types;

// Re-export main types for convenience
pub use archive::{CacheFile, DirectoryArchive, TrendFile, TrendSource};
pub use channels::ChannelSelection;
pub use comparator::{Comparator, Comparison};
pub use config::ConlogConfig;
pub use detector::detect_changes;
pub use time::{gps_to_utc, parse_gps, utc_to_gps, Timestamp};
pub use timeseries::TimeSeries;
pub use types::{ChangeRecord, Channel, ConlogError, GpsTime, Result, Segment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
