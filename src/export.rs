use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::traffic::{TrafficTable, TrafficType};

/// `geo_traffic_{type}_{start}_to_{end}.csv`, using the months as the user typed them.
pub fn default_filename(traffic_type: TrafficType, start: &str, end: &str) -> String {
    format!("geo_traffic_{}_{}_to_{}.csv", traffic_type, start.trim(), end.trim())
}

/// Writes a header row followed by every row of `table`.
pub fn write_csv<W: Write>(table: &TrafficTable, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(TrafficTable::COLUMNS)?;
    for row in table.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &TrafficTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create export file {:?}", path))?;
    write_csv(table, file).with_context(|| format!("Failed to write export file {:?}", path))?;
    info!(action = "export", component = "csv_export", file_path = ?path, rows = table.len(), "Exported results");
    Ok(())
}
