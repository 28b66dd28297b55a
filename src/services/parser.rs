// src/services/parser.rs

//! Fixed-width feed parser.
//!
//! Turns the KOERI "last events" report into [`EarthquakeRecord`]s. Parsing is
//! pure and never fails as a whole: lines that cannot be read are skipped and
//! logged at debug level.
//!
//! ## Report shape
//!
//! ```text
//!                                                Büyüklük
//! Tarih      Saat      Enlem(N) Boylam(E) Der(km) MD   ML   Mw   Yer
//! ---------- -------- -------- -------- ------ ---- ---- ---- --------------
//! 2024.03.15 14:23:11  38.1234  27.5678   7.3 -.-  3.2 -.-      IZMIR KORFEZI
//! ```
//!
//! The header is found by content, data starts after the separator line, and
//! every field is cut from fixed character columns (see [`ColumnLayout`]).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::Result;
use crate::models::{ColumnLayout, Config, EarthquakeRecord, MAGNITUDE_PLACEHOLDER, MagnitudeDetail};

/// Column title of the magnitude group.
pub const MAGNITUDE_TOKEN: &str = "Büyüklük";

/// Column title of the date field.
pub const DATE_TOKEN: &str = "Tarih";

/// Lines between the header and the first data line (header + separator).
const HEADER_SPAN: usize = 2;

/// Reason a single data line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Shorter than the widest fixed column
    TooShort { width: usize, required: usize },
    /// Latitude or longitude is not a number
    Coordinates,
    /// None of MD, ML, Mw is numeric
    NoMagnitude,
    /// Date and time do not form a valid instant
    Timestamp(String),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { width, required } => {
                write!(f, "line too short ({width} < {required} chars)")
            }
            Self::Coordinates => write!(f, "unparseable coordinates"),
            Self::NoMagnitude => write!(f, "no magnitude reported"),
            Self::Timestamp(raw) => write!(f, "invalid timestamp '{raw}'"),
        }
    }
}

/// Locate the first data line.
///
/// The header is the first line containing the date title whose own text, or
/// the line right above it, also carries the magnitude title (KOERI prints the
/// magnitude group label above the MD/ML/Mw columns). Returns `None` when no
/// header is present.
pub fn locate_data_start(lines: &[&str]) -> Option<usize> {
    lines.iter().enumerate().find_map(|(i, line)| {
        if !line.contains(DATE_TOKEN) {
            return None;
        }
        let magnitude_here = line.contains(MAGNITUDE_TOKEN);
        let magnitude_above = i > 0 && lines[i - 1].contains(MAGNITUDE_TOKEN);
        (magnitude_here || magnitude_above).then_some(i + HEADER_SPAN)
    })
}

/// Parse a numeric field; the placeholder and blanks mean "not reported".
fn parse_optional(field: &str) -> Option<f64> {
    if field.is_empty() || field == MAGNITUDE_PLACEHOLDER {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a coordinate in degrees, rejecting non-finite and out-of-range values.
fn parse_coordinate(field: &str, limit: f64) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Parser for the fixed-width feed.
#[derive(Debug, Clone)]
pub struct FeedParser {
    layout: ColumnLayout,
    tz: Tz,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new(ColumnLayout::default(), chrono_tz::Europe::Istanbul)
    }
}

impl FeedParser {
    /// Create a parser for the given layout; feed times are read in `tz`.
    pub fn new(layout: ColumnLayout, tz: Tz) -> Self {
        Self { layout, tz }
    }

    /// Build a parser from the `[parser]` and `[feed]` configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.parser.layout.validate()?;
        Ok(Self::new(config.parser.layout.clone(), config.feed.tz()?))
    }

    /// Parse raw feed text into records, preserving feed order.
    ///
    /// Without a recognizable header the whole input is treated as data from
    /// line 0; header and separator lines then simply fail to parse.
    pub fn parse(&self, raw: &str) -> Vec<EarthquakeRecord> {
        let lines: Vec<&str> = raw.lines().collect();
        let start = match locate_data_start(&lines) {
            Some(start) => start,
            None => {
                if !raw.trim().is_empty() {
                    log::warn!("Feed header not found; parsing all {} lines as data", lines.len());
                }
                0
            }
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (i, raw_line) in lines.iter().enumerate().skip(start) {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            match self.parse_line(line) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    log::debug!("Skipping line {}: {} ({:?})", i + 1, reason, line);
                }
            }
        }

        log::debug!("Parsed {} records, skipped {} lines", records.len(), skipped);
        records
    }

    /// Parse one trimmed data line.
    pub fn parse_line(&self, line: &str) -> std::result::Result<EarthquakeRecord, LineError> {
        let chars: Vec<char> = line.chars().collect();
        let layout = &self.layout;
        let required = layout.min_width();
        let too_short = || LineError::TooShort {
            width: chars.len(),
            required,
        };
        if chars.len() < required {
            return Err(too_short());
        }

        let field = |column: crate::models::Column| column.extract(&chars).ok_or_else(too_short);

        let date = field(layout.date)?;
        let time = field(layout.time)?;
        let latitude = parse_coordinate(&field(layout.latitude)?, 90.0);
        let longitude = parse_coordinate(&field(layout.longitude)?, 180.0);
        let depth_km = parse_optional(&field(layout.depth)?);
        let magnitude_detail = MagnitudeDetail {
            md: parse_optional(&field(layout.md)?),
            ml: parse_optional(&field(layout.ml)?),
            mw: parse_optional(&field(layout.mw)?),
        };
        let location = chars
            .get(layout.location_start..)
            .map(|rest| rest.iter().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let magnitude = magnitude_detail.preferred().ok_or(LineError::NoMagnitude)?;
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(LineError::Coordinates);
        };
        let occurred_at = self.parse_timestamp(&date, &time)?;

        Ok(EarthquakeRecord {
            occurred_at,
            magnitude,
            magnitude_detail,
            latitude,
            longitude,
            depth_km,
            location,
        })
    }

    /// Combine `YYYY.MM.DD` and `HH:MM:SS` in the feed zone into a UTC instant.
    fn parse_timestamp(
        &self,
        date: &str,
        time: &str,
    ) -> std::result::Result<chrono::DateTime<Utc>, LineError> {
        let invalid = || LineError::Timestamp(format!("{date} {time}"));

        let date = NaiveDate::parse_from_str(date, "%Y.%m.%d").map_err(|_| invalid())?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|_| invalid())?;
        let local = NaiveDateTime::new(date, time);

        // Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant.
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(invalid)
    }
}
