use std::time::Instant;
use tracing::{error, info, warn};

use crate::collector::{Collector, UnitOutcome, UnitReport};
use crate::error::{InputError, PlanError};
use crate::months::{generate_monthly_ranges, MonthRange};
use crate::provider::TrafficSource;
use crate::retry::Sleeper;
use crate::sink::Sink;
use crate::traffic::{TrafficTable, TrafficType};

/// Everything one run needs, fixed before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub credential: String,
    pub traffic_type: TrafficType,
    pub start_month: String,
    pub end_month: String,
    pub domains: Vec<String>,
    pub limit: u32,
}

impl RunRequest {
    /// Checks the run preconditions. Domains are expected to be cleaned already.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.credential.trim().is_empty() {
            return Err(InputError::MissingCredential);
        }
        if self.start_month.trim().is_empty() || self.end_month.trim().is_empty() {
            return Err(InputError::MissingDates);
        }
        if self.domains.is_empty() {
            return Err(InputError::NoDomains);
        }
        if self.limit == 0 {
            return Err(InputError::InvalidLimit);
        }
        Ok(())
    }

    pub fn plan(&self) -> Result<Vec<MonthRange>, PlanError> {
        generate_monthly_ranges(&self.start_month, &self.end_month)
    }
}

/// Reasons a run never started.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// How the collector is driven for each month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fetching {
    #[default]
    Sequential,
    Parallel { workers: usize },
}

#[derive(Debug)]
pub struct SinkFailure {
    pub domain: String,
    pub range: MonthRange,
    pub rows: usize,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub months: Vec<MonthRange>,
    pub table: TrafficTable,
    pub reports: Vec<UnitReport>,
    pub sink_failures: Vec<SinkFailure>,
}

impl RunSummary {
    /// Reports for units that produced no rows.
    pub fn warnings(&self) -> impl Iterator<Item = &UnitReport> {
        self.reports
            .iter()
            .filter(|r| !matches!(r.outcome, UnitOutcome::Data(_)))
    }

    pub fn failed_units(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, UnitOutcome::Failed(_)))
            .count()
    }
}

/// Plans the months, collects every (month, domain) unit of `request`, forwards
/// each batch to `sink` and folds it into the result table.
///
/// Precondition failures abort before any request. Everything after that is
/// isolated per unit: failed fetches and failed sink writes are recorded in the
/// summary and the run carries on.
pub fn run<S, Z, K>(
    request: &RunRequest,
    collector: &Collector<S, Z>,
    sink: &mut K,
    sheet: &str,
    fetching: Fetching,
) -> Result<RunSummary, RunError>
where
    S: TrafficSource,
    Z: Sleeper,
    K: Sink + ?Sized,
{
    request.validate()?;
    let months = request.plan()?;
    let start_time = Instant::now();

    info!(
        action = "start",
        component = "pipeline",
        traffic_type = %request.traffic_type,
        month_count = months.len(),
        domain_count = request.domains.len(),
        sink = sink.name(),
        "Starting run"
    );

    let mut summary = RunSummary {
        months: months.clone(),
        ..RunSummary::default()
    };

    for range in months {
        let reports: Box<dyn Iterator<Item = UnitReport> + '_> = match fetching {
            Fetching::Sequential => Box::new(collector.batches(request, range)),
            Fetching::Parallel { workers } => Box::new(collector.collect_parallel(request, range, workers).into_iter()),
        };

        let mut month_rows = 0;
        for report in reports {
            let rows = report.rows();
            if !rows.is_empty() {
                if let Err(e) = sink.append(sheet, rows) {
                    error!(
                        action = "append",
                        component = "pipeline",
                        domain = %report.domain,
                        month = %range.start,
                        sink = sink.name(),
                        error = %e,
                        "Failed to persist batch"
                    );
                    summary.sink_failures.push(SinkFailure {
                        domain: report.domain.clone(),
                        range,
                        rows: rows.len(),
                        error: e.to_string(),
                    });
                }
                month_rows += rows.len();
                summary.table.append(rows.iter().cloned());
            }
            summary.reports.push(report);
        }

        if month_rows == 0 {
            warn!(action = "complete", component = "pipeline", month = %range.start, "No rows collected for month");
        }
    }

    info!(
        action = "complete",
        component = "pipeline",
        rows = summary.table.len(),
        failed_units = summary.failed_units(),
        sink_failures = summary.sink_failures.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Run completed"
    );
    Ok(summary)
}
