//! Append-only destinations for normalized rows.
//!
//! Every sink writes the column names as a header row the first time a sheet is
//! touched and then appends rows verbatim. Nothing is deduplicated, so replaying
//! the same batch appends the same rows again.

pub mod csv_sheet;
pub mod google_sheets;
pub mod sqlite;

pub use csv_sheet::CsvSheetSink;
pub use google_sheets::GoogleSheetsSink;
pub use sqlite::SqliteSheetSink;

use crate::error::{SinkError, SinkResult};
use crate::traffic::TrafficRecord;

pub const DEFAULT_SHEET: &str = "geo_distribution";

pub trait Sink {
    /// Appends `rows` to `sheet`, writing the header row first if the sheet has none.
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()>;

    fn name(&self) -> &'static str;
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()> {
        (**self).append(sheet, rows)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn append(&mut self, _sheet: &str, _rows: &[TrafficRecord]) -> SinkResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Sheet names double as file and table names for the local sinks.
pub(crate) fn validate_sheet_name(sheet: &str) -> SinkResult<()> {
    let ok = !sheet.is_empty()
        && sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(SinkError::InvalidSheet(sheet.to_string()))
    }
}
