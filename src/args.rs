use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use crate::traffic::TrafficType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    None,
    Csv,
    Sqlite,
    GoogleSheets,
}

#[derive(Parser, Debug)]
#[command(
    name = "geoshare",
    about = "Fetch country-level traffic share for a list of domains, month by month",
    version,
    long_about = None
)]
#[command(group(ArgGroup::new("domains").required(true).multiple(true).args(["domain", "list", "file"])))]
pub struct Args {
    /// Provider API key
    #[arg(long, env = "SIMILARWEB_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// Traffic type to query
    #[arg(short = 't', long, value_enum, default_value_t = TrafficType::AllTraffic)]
    pub traffic_type: TrafficType,

    /// First month (YYYY-MM), defaults to last month
    #[arg(short, long)]
    pub start: Option<String>,

    /// Last month (YYYY-MM), defaults to last month
    #[arg(short, long)]
    pub end: Option<String>,

    /// Maximum rows per domain and month
    #[arg(short, long, default_value_t = 1000)]
    pub limit: u32,

    /// Single domain to query (repeatable)
    #[arg(short, long)]
    pub domain: Vec<String>,

    /// File with one domain per line, `-` for stdin
    #[arg(long)]
    pub list: Option<PathBuf>,

    /// CSV file whose first column holds domains
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Where fetched batches are appended
    #[arg(long, value_enum, default_value_t = SinkKind::Csv)]
    pub sink: SinkKind,

    /// Target sheet name
    #[arg(long, default_value = crate::sink::DEFAULT_SHEET)]
    pub sheet: String,

    /// Directory (csv sink) or database file (sqlite sink)
    #[arg(long)]
    pub sink_path: Option<PathBuf>,

    /// Spreadsheet id for the google-sheets sink
    #[arg(long, env = "GEOSHARE_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// OAuth bearer token for the google-sheets sink
    #[arg(long, env = "GEOSHARE_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    /// Export path for the combined results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the CSV export
    #[arg(long)]
    pub no_export: bool,

    /// Provider base URL
    #[arg(long, env = "GEOSHARE_BASE_URL", default_value = crate::provider::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Fetch the domains of each month concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Number of worker threads for --parallel
    #[arg(short, long, requires = "parallel")]
    pub workers: Option<usize>,

    /// Mask the API key in stored rows and printed output
    #[arg(long)]
    pub redact: bool,

    /// Number of result rows to print
    #[arg(long)]
    pub top: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
