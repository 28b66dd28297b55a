//! Diff between successive record sets.
//!
//! Used to report how many events appeared since the previous refresh.

use std::collections::HashSet;

use crate::models::EarthquakeRecord;

/// Difference between two record sets, by [`EarthquakeRecord::id`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDiff {
    /// Records present now but not before, in feed order
    pub added: Vec<EarthquakeRecord>,
    /// Ids present before but gone now
    pub removed: Vec<String>,
}

impl RecordDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Calculate the diff between the previous and current record sets.
pub fn calculate_diff(previous: &[EarthquakeRecord], current: &[EarthquakeRecord]) -> RecordDiff {
    let prev_ids: HashSet<String> = previous.iter().map(EarthquakeRecord::id).collect();
    let curr_ids: HashSet<String> = current.iter().map(EarthquakeRecord::id).collect();

    let added = current
        .iter()
        .filter(|r| !prev_ids.contains(&r.id()))
        .cloned()
        .collect();

    let removed = previous
        .iter()
        .map(EarthquakeRecord::id)
        .filter(|id| !curr_ids.contains(id))
        .collect();

    RecordDiff { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MagnitudeDetail;
    use chrono::{Duration, TimeZone, Utc};

    fn record(minute: i64) -> EarthquakeRecord {
        EarthquakeRecord {
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
                + Duration::minutes(minute),
            magnitude: 2.0,
            magnitude_detail: MagnitudeDetail {
                md: None,
                ml: Some(2.0),
                mw: None,
            },
            latitude: 38.0,
            longitude: 27.0,
            depth_km: Some(5.0),
            location: format!("EVENT {minute}"),
        }
    }

    #[test]
    fn test_new_events_detected() {
        let previous = vec![record(2), record(1)];
        let current = vec![record(4), record(3), record(2)];

        let diff = calculate_diff(&previous, &current);
        assert!(diff.has_changes());
        assert_eq!(diff.added.len(), 2);
        assert_eq!(diff.added[0].location, "EVENT 4");
        assert_eq!(diff.removed, vec![record(1).id()]);
    }

    #[test]
    fn test_no_changes() {
        let records = vec![record(1), record(0)];
        let diff = calculate_diff(&records, &records);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_first_refresh_everything_added() {
        let current = vec![record(1), record(0)];
        let diff = calculate_diff(&[], &current);
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());
    }
}
