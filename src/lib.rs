pub mod args;
pub mod collector;
pub mod domain;
pub mod error;
pub mod export;
pub mod months;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod retry;
pub mod sink;
pub mod traffic;
pub mod utils;

pub use args::Args;
pub use collector::{Collector, UnitOutcome, UnitReport};
pub use months::{generate_monthly_ranges, MonthId, MonthRange};
pub use pipeline::{run, RunRequest, RunSummary};
pub use traffic::{TrafficRecord, TrafficTable, TrafficType};
