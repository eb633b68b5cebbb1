//! GPS time conversions
//!
//! GPS time counts SI seconds since 1980-01-06T00:00:00 UTC and does not
//! observe leap seconds, so converting to UTC needs the table of leap
//! seconds inserted since the GPS epoch.

use crate::types::{ConlogError, GpsTime, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Timestamp type used for human-readable times
pub type Timestamp = DateTime<Utc>;

/// Unix time of the GPS epoch
const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// GPS times of each inserted leap second, labelled by the UTC day that follows
const LEAP_SECONDS: [i64; 18] = [
    46_828_800,    // 1981-07-01
    78_364_801,    // 1982-07-01
    109_900_802,   // 1983-07-01
    173_059_203,   // 1985-07-01
    252_028_804,   // 1988-01-01
    315_187_205,   // 1990-01-01
    346_723_206,   // 1991-01-01
    393_984_007,   // 1992-07-01
    425_520_008,   // 1993-07-01
    457_056_009,   // 1994-07-01
    504_489_610,   // 1996-01-01
    551_750_411,   // 1997-07-01
    599_184_012,   // 1999-01-01
    820_108_813,   // 2006-01-01
    914_803_214,   // 2009-01-01
    1_025_136_015, // 2012-07-01
    1_119_744_016, // 2015-07-01
    1_167_264_017, // 2017-01-01
];

/// Number of leap seconds between the GPS epoch and `gps`
fn leap_seconds_at(gps: GpsTime) -> i64 {
    LEAP_SECONDS.iter().filter(|&&leap| gps >= leap as f64).count() as i64
}

/// Convert a GPS time to UTC
///
/// Returns `None` for times chrono cannot represent.
pub fn gps_to_utc(gps: GpsTime) -> Option<Timestamp> {
    if !gps.is_finite() {
        return None;
    }
    let whole = gps.floor();
    let nanos = (((gps - whole) * 1e9).round() as u32).min(999_999_999);
    let unix = whole as i64 - leap_seconds_at(gps) + GPS_EPOCH_UNIX;
    DateTime::from_timestamp(unix, nanos)
}

/// Convert a UTC time to GPS
pub fn utc_to_gps(time: &Timestamp) -> GpsTime {
    let since_epoch = time.timestamp() - GPS_EPOCH_UNIX;
    let leaps = LEAP_SECONDS
        .iter()
        .enumerate()
        .filter(|(inserted, &leap)| since_epoch >= leap - *inserted as i64)
        .count() as i64;
    (since_epoch + leaps) as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9
}

/// Parse a GPS number or a UTC date into GPS time
///
/// Accepted forms: `1262304018`, `1262304018.5`, `2020-01-01T00:00:00Z`,
/// `2020-01-01 00:00:00` and `2020-01-01`. Dates without an offset are UTC.
pub fn parse_gps(text: &str) -> Result<GpsTime> {
    let text = text.trim();

    if let Ok(gps) = text.parse::<f64>() {
        if gps.is_finite() && gps >= 0.0 {
            return Ok(gps);
        }
        return Err(ConlogError::InvalidTime(format!(
            "GPS time must be a finite, non-negative number: {:?}",
            text
        )));
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(utc_to_gps(&time.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(utc_to_gps(&Utc.from_utc_datetime(&naive)));
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(utc_to_gps(&Utc.from_utc_datetime(&midnight)));
    }

    Err(ConlogError::InvalidTime(format!(
        "cannot interpret {:?} as a GPS time or UTC date",
        text
    )))
}
