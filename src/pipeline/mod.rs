//! Refresh pipeline.
//!
//! - `refresh`: single-flight fetch → parse → cache → publish cycle
//! - `schedule`: startup, interval and manual triggers
//! - `diff`: new-event detection between cycles

pub mod diff;
pub mod refresh;
pub mod schedule;

#[cfg(test)]
pub(crate) mod testing;

pub use diff::{RecordDiff, calculate_diff};
pub use refresh::{RefreshController, RefreshOutcome, RefreshState};
pub use schedule::{Trigger, run as run_scheduler};
