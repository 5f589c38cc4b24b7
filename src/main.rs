use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use geoshare::args::{Args, SinkKind};
use geoshare::pipeline::{self, Fetching, RunRequest};
use geoshare::provider::{HttpTrafficSource, ProviderConfig, DEFAULT_SOURCE};
use geoshare::sink::{CsvSheetSink, GoogleSheetsSink, NullSink, Sink, SqliteSheetSink};
use geoshare::{domain, export, months, report, utils, Collector};

fn collect_domains(args: &Args) -> Result<Vec<String>> {
    let mut domains = domain::clean_domains(&args.domain);
    if let Some(path) = &args.list {
        domains.extend(domain::read_domain_list(path)?);
    }
    if let Some(path) = &args.file {
        domains.extend(domain::read_domain_file(path)?);
    }
    Ok(domains)
}

fn open_sink(args: &Args) -> Result<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match args.sink {
        SinkKind::None => Box::new(NullSink),
        SinkKind::Csv => Box::new(CsvSheetSink::new(
            args.sink_path.clone().unwrap_or_else(|| PathBuf::from("geo_sheets")),
        )),
        SinkKind::Sqlite => {
            let path = args.sink_path.clone().unwrap_or_else(|| PathBuf::from("geo_sheets.db"));
            Box::new(SqliteSheetSink::open(&path).with_context(|| format!("Failed to open {:?}", path))?)
        }
        SinkKind::GoogleSheets => {
            let spreadsheet_id = args
                .spreadsheet_id
                .as_deref()
                .context("--spreadsheet-id is required for the google-sheets sink")?;
            let token = args
                .sheets_token
                .as_deref()
                .context("--sheets-token is required for the google-sheets sink")?;
            Box::new(GoogleSheetsSink::new(
                spreadsheet_id,
                token,
                Duration::from_secs(args.timeout),
            )?)
        }
    };
    Ok(sink)
}

fn execute(args: &Args) -> Result<()> {
    let last_month = months::previous_month(Local::now().date_naive()).to_string();
    let start = args.start.clone().unwrap_or_else(|| last_month.clone());
    let end = args.end.clone().unwrap_or(last_month);

    let request = RunRequest {
        credential: args.api_key.trim().to_string(),
        traffic_type: args.traffic_type,
        start_month: start,
        end_month: end,
        domains: collect_domains(args)?,
        limit: args.limit,
    };
    request.validate()?;

    let source = HttpTrafficSource::new(ProviderConfig {
        base_url: args.base_url.clone(),
        source: DEFAULT_SOURCE.to_string(),
        timeout: Duration::from_secs(args.timeout),
    })?;
    let mut collector = Collector::new(source);
    if args.redact {
        collector = collector.with_provenance(&utils::redact_credential(&request.credential));
    }

    let fetching = if args.parallel {
        let workers = args.workers.unwrap_or_else(|| {
            let cpu_count = num_cpus::get();
            std::cmp::min(cpu_count, 8)
        });
        Fetching::Parallel { workers }
    } else {
        Fetching::Sequential
    };

    let mut sink = open_sink(args)?;
    let summary = pipeline::run(&request, &collector, &mut sink, &args.sheet, fetching)?;

    report::print_results(&summary, request.traffic_type, args.top, args.redact)?;

    if !args.no_export && !summary.table.is_empty() {
        let path = args.output.clone().unwrap_or_else(|| {
            PathBuf::from(export::default_filename(
                request.traffic_type,
                &request.start_month,
                &request.end_month,
            ))
        });
        export::write_csv_file(&summary.table, &path)?;
        println!("\nSaved {} rows to {}", summary.table.len(), path.display());
    }

    info!(action = "complete", component = "main", rows = summary.table.len(), "Done");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    if let Err(e) = execute(&args) {
        error!(action = "abort", component = "main", error = %e, "Run failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
