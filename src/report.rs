use anyhow::Result;
use std::io::{self, Write};

use crate::pipeline::RunSummary;
use crate::traffic::{TrafficTable, TrafficType};
use crate::utils::{format_number, redact_credential};

/// Tab-separated header and rows, `redact` masking the credential column.
pub fn write_rows<W: Write>(table: &TrafficTable, top: Option<usize>, redact: bool, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(TrafficTable::COLUMNS)?;
    for row in table.rows().iter().take(top.unwrap_or(table.len())) {
        if redact {
            let mut row = row.clone();
            row.api_key = redact_credential(&row.api_key);
            writer.serialize(&row)?;
        } else {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn print_results(summary: &RunSummary, traffic_type: TrafficType, top: Option<usize>, redact: bool) -> Result<()> {
    println!("\n--- Geo Traffic ({}) ---", traffic_type);

    match (summary.months.first(), summary.months.last()) {
        (Some(first), Some(last)) => println!(
            "Months: {} to {} ({} months)",
            first.start,
            last.end,
            format_number(summary.months.len() as u64)
        ),
        _ => println!("Months: none"),
    }

    println!(
        "Units fetched: {} ({} failed)",
        format_number(summary.reports.len() as u64),
        format_number(summary.failed_units() as u64)
    );
    println!("Rows collected: {}", format_number(summary.table.len() as u64));

    let warnings: Vec<String> = summary.warnings().filter_map(|r| r.message()).collect();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("- {}", warning);
        }
    }

    if !summary.sink_failures.is_empty() {
        println!("\nRows not persisted:");
        for failure in &summary.sink_failures {
            println!(
                "- {} for {}: {} rows ({})",
                failure.domain, failure.range.start, failure.rows, failure.error
            );
        }
    }

    if summary.table.is_empty() {
        println!("\nNo data found for the given domains and date range.");
        return Ok(());
    }

    let shown = top.unwrap_or(summary.table.len()).min(summary.table.len());
    println!("\nResults (showing {} of {}):", shown, summary.table.len());
    write_rows(&summary.table, Some(shown), redact, io::stdout().lock())
}
