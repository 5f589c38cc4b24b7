use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::{validate_sheet_name, Sink};
use crate::error::SinkResult;
use crate::traffic::TrafficRecord;

/// A SQLite "workbook": one table per sheet. Creating the table plays the role
/// of writing the header row.
pub struct SqliteSheetSink {
    conn: Connection,
}

impl SqliteSheetSink {
    pub fn open(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;
        info!(action = "open", component = "sqlite_sink", file_path = ?path, "Opened sheet database");
        Ok(Self { conn })
    }

    pub fn in_memory() -> SinkResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows currently stored in `sheet`, zero if the sheet does not exist.
    pub fn row_count(&self, sheet: &str) -> SinkResult<usize> {
        validate_sheet_name(sheet)?;
        if !self.has_sheet(sheet)? {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", sheet), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn has_sheet(&self, sheet: &str) -> SinkResult<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [sheet],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }
}

impl Sink for SqliteSheetSink {
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()> {
        validate_sheet_name(sheet)?;
        let start_time = Instant::now();

        if !self.has_sheet(sheet)? {
            info!(action = "header", component = "sqlite_sink", sheet, "Creating sheet table");
            self.conn.execute_batch(&format!(
                "CREATE TABLE \"{}\" (
                    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    domain TEXT NOT NULL,
                    country_name TEXT,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    share REAL,
                    visits REAL,
                    api_key TEXT NOT NULL
                )",
                sheet
            ))?;
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{}\" (domain, country_name, start_date, end_date, share, visits, api_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                sheet
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.domain,
                    row.country_name,
                    row.start_date.to_string(),
                    row.end_date.to_string(),
                    row.share,
                    row.visits,
                    row.api_key,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            action = "append",
            component = "sqlite_sink",
            sheet,
            rows = rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Rows appended"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
