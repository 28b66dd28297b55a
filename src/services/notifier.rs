// src/services/notifier.rs

//! Presentation boundary.
//!
//! The refresh controller only talks to a [`Notifier`]: it publishes record
//! lists and emits leveled messages. [`ConsoleNotifier`] renders both to the
//! terminal.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use crate::models::{DisplayConfig, EarthquakeRecord, Observer, UserZone};
use crate::utils::geo::distance_km;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// Consumer of refresh results.
pub trait Notifier: Send + Sync {
    /// Replace the displayed record list.
    fn publish(&self, records: &[EarthquakeRecord]);

    /// Show a message to the user.
    fn notify(&self, message: &str, level: Level);

    /// Toggle a busy indicator while a refresh is in flight.
    fn progress(&self, _active: bool) {}
}

/// Terminal renderer for record lists and notifications.
pub struct ConsoleNotifier {
    display: DisplayConfig,
    zones: Vec<UserZone>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleNotifier {
    /// Render to stdout.
    pub fn new(display: DisplayConfig, zones: Vec<UserZone>) -> Self {
        Self::with_writer(display, zones, Box::new(std::io::stdout()))
    }

    /// Render to an arbitrary writer.
    pub fn with_writer(
        display: DisplayConfig,
        zones: Vec<UserZone>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            display,
            zones,
            out: Mutex::new(out),
        }
    }

    /// Records shown: at or above the minimum magnitude, newest first, capped.
    pub fn visible<'a>(&self, records: &'a [EarthquakeRecord]) -> Vec<&'a EarthquakeRecord> {
        records
            .iter()
            .filter(|r| r.magnitude >= self.display.min_magnitude)
            .take(self.display.max_items)
            .collect()
    }

    /// One display line for a record.
    pub fn render_line(&self, record: &EarthquakeRecord) -> String {
        let mut line = record.format("M{magnitude} {time}  {location}");

        if let Some(Observer { lat, lng }) = self.display.observer {
            let km = distance_km(lat, lng, record.latitude, record.longitude);
            line.push_str(&format!("  [{km:.1} km away]"));
        }

        let zones: Vec<&str> = self
            .zones
            .iter()
            .filter(|z| z.contains(record))
            .map(|z| z.name.as_str())
            .collect();
        if !zones.is_empty() {
            line.push_str(&format!("  <{}>", zones.join(", ")));
        }

        line
    }
}

impl Notifier for ConsoleNotifier {
    fn publish(&self, records: &[EarthquakeRecord]) {
        let lines: Vec<String> = self
            .visible(records)
            .into_iter()
            .map(|r| self.render_line(r))
            .collect();

        let Ok(mut out) = self.out.lock() else {
            log::error!("Console writer lock poisoned");
            return;
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                log::error!("Failed to write record list: {e}");
                return;
            }
        }
        let _ = out.flush();
    }

    fn notify(&self, message: &str, level: Level) {
        match level {
            Level::Info | Level::Success => log::info!("{message}"),
            Level::Warning => log::warn!("{message}"),
            Level::Error => log::error!("{message}"),
        }
    }

    fn progress(&self, active: bool) {
        if active {
            log::debug!("Refreshing earthquake data...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MagnitudeDetail;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    /// Writer that keeps everything in a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn record(magnitude: f64, location: &str) -> EarthquakeRecord {
        EarthquakeRecord {
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 15, 11, 23, 11).unwrap(),
            magnitude,
            magnitude_detail: MagnitudeDetail {
                md: None,
                ml: Some(magnitude),
                mw: None,
            },
            latitude: 38.1234,
            longitude: 27.5678,
            depth_km: Some(7.3),
            location: location.to_string(),
        }
    }

    #[test]
    fn test_visible_filters_and_caps() {
        let display = DisplayConfig {
            min_magnitude: 2.0,
            max_items: 2,
            observer: None,
        };
        let notifier = ConsoleNotifier::new(display, Vec::new());
        let records = vec![
            record(1.5, "A"),
            record(2.5, "B"),
            record(3.0, "C"),
            record(4.0, "D"),
        ];
        let visible: Vec<&str> = notifier
            .visible(&records)
            .iter()
            .map(|r| r.location.as_str())
            .collect();
        assert_eq!(visible, vec!["B", "C"]);
    }

    #[test]
    fn test_render_line_with_observer_and_zone() {
        let display = DisplayConfig {
            observer: Some(Observer {
                lat: 38.1234,
                lng: 27.5678,
            }),
            ..DisplayConfig::default()
        };
        let zones = vec![UserZone {
            name: "Izmir".to_string(),
            lat: 38.42,
            lng: 27.14,
            radius_km: 100.0,
        }];
        let notifier = ConsoleNotifier::new(display, zones);
        let line = notifier.render_line(&record(3.2, "IZMIR KORFEZI"));

        assert!(line.starts_with("M3.2"));
        assert!(line.contains("2024-03-15 11:23:11 UTC"));
        assert!(line.contains("[0.0 km away]"));
        assert!(line.ends_with("<Izmir>"));
    }

    #[test]
    fn test_publish_writes_lines() {
        let buf = SharedBuf::default();
        let notifier =
            ConsoleNotifier::with_writer(DisplayConfig::default(), Vec::new(), Box::new(buf.clone()));
        notifier.publish(&[record(3.2, "IZMIR KORFEZI"), record(2.1, "DATCA")]);

        let out = buf.contents();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("IZMIR KORFEZI"));
    }
}
