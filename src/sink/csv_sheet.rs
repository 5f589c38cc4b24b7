use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{validate_sheet_name, Sink};
use crate::error::SinkResult;
use crate::traffic::{TrafficRecord, TrafficTable};

/// One `<sheet>.csv` file per sheet inside a directory.
#[derive(Debug, Clone)]
pub struct CsvSheetSink {
    dir: PathBuf,
}

impl CsvSheetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvSheetSink { dir: dir.into() }
    }

    pub fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet))
    }

    /// A sheet has a header when its first line is non-blank.
    fn has_header(path: &Path) -> SinkResult<bool> {
        if !path.exists() {
            return Ok(false);
        }
        let mut first = String::new();
        BufReader::new(fs::File::open(path)?).read_line(&mut first)?;
        Ok(!first.trim().is_empty())
    }
}

impl Sink for CsvSheetSink {
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()> {
        validate_sheet_name(sheet)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.sheet_path(sheet);
        let needs_header = !Self::has_header(&path)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            debug!(action = "header", component = "csv_sink", file_path = ?path, "Writing header row");
            writer.write_record(TrafficTable::COLUMNS)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(action = "append", component = "csv_sink", file_path = ?path, rows = rows.len(), "Rows appended");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
