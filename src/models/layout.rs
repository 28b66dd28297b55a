//! Fixed-width column layout of the feed.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Half-open character range `[start, end)` within a data line.
///
/// Serialized as a two-element array, e.g. `date = [0, 10]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column(pub usize, pub usize);

impl Column {
    pub fn start(&self) -> usize {
        self.0
    }

    pub fn end(&self) -> usize {
        self.1
    }

    /// Slice this column out of a line already split into characters.
    ///
    /// Returns the trimmed field, or `None` if the line ends before the column does.
    pub fn extract(&self, chars: &[char]) -> Option<String> {
        let field = chars.get(self.0..self.1)?;
        Some(field.iter().collect::<String>().trim().to_string())
    }
}

/// Character offsets of every field in a data line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnLayout {
    #[serde(default = "defaults::date")]
    pub date: Column,
    #[serde(default = "defaults::time")]
    pub time: Column,
    #[serde(default = "defaults::latitude")]
    pub latitude: Column,
    #[serde(default = "defaults::longitude")]
    pub longitude: Column,
    #[serde(default = "defaults::depth")]
    pub depth: Column,
    #[serde(default = "defaults::md")]
    pub md: Column,
    #[serde(default = "defaults::ml")]
    pub ml: Column,
    #[serde(default = "defaults::mw")]
    pub mw: Column,
    /// Location text runs from here to the end of the line
    #[serde(default = "defaults::location_start")]
    pub location_start: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: defaults::date(),
            time: defaults::time(),
            latitude: defaults::latitude(),
            longitude: defaults::longitude(),
            depth: defaults::depth(),
            md: defaults::md(),
            ml: defaults::ml(),
            mw: defaults::mw(),
            location_start: defaults::location_start(),
        }
    }
}

impl ColumnLayout {
    fn columns(&self) -> [(&'static str, Column); 8] {
        [
            ("date", self.date),
            ("time", self.time),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("depth", self.depth),
            ("md", self.md),
            ("ml", self.ml),
            ("mw", self.mw),
        ]
    }

    /// Shortest line (in characters) that holds every fixed column.
    pub fn min_width(&self) -> usize {
        self.columns()
            .iter()
            .map(|(_, c)| c.end())
            .max()
            .unwrap_or(0)
    }

    /// Check that columns are non-empty, ordered, and non-overlapping.
    pub fn validate(&self) -> Result<()> {
        let mut prev_end = 0;
        for (name, column) in self.columns() {
            if column.start() >= column.end() {
                return Err(AppError::validation(format!(
                    "parser.layout.{name} is empty ({}..{})",
                    column.start(),
                    column.end()
                )));
            }
            if column.start() < prev_end {
                return Err(AppError::validation(format!(
                    "parser.layout.{name} overlaps the previous column"
                )));
            }
            prev_end = column.end();
        }
        if self.location_start < prev_end {
            return Err(AppError::validation(
                "parser.layout.location_start overlaps the magnitude columns",
            ));
        }
        Ok(())
    }
}

mod defaults {
    use super::Column;

    // 2024.03.15 14:23:11  38.1234  27.5678   7.3 -.-  3.2 -.-      IZMIR KORFEZI
    pub fn date() -> Column {
        Column(0, 10)
    }
    pub fn time() -> Column {
        Column(11, 19)
    }
    pub fn latitude() -> Column {
        Column(19, 28)
    }
    pub fn longitude() -> Column {
        Column(28, 37)
    }
    pub fn depth() -> Column {
        Column(37, 44)
    }
    pub fn md() -> Column {
        Column(44, 48)
    }
    pub fn ml() -> Column {
        Column(48, 52)
    }
    pub fn mw() -> Column {
        Column(52, 56)
    }
    pub fn location_start() -> usize {
        56
    }
}
