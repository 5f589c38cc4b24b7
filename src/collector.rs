use rayon::prelude::*;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::FetchError;
use crate::months::MonthRange;
use crate::pipeline::RunRequest;
use crate::provider::{ProviderResponse, TrafficQuery, TrafficSource};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::traffic::{ProviderPayload, TaggedRecord, TrafficRecord, TrafficTable, TrafficType};

/// Terminal state of one (domain, month) unit.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Data(Vec<TrafficRecord>),
    Empty,
    Failed(FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub domain: String,
    pub traffic_type: TrafficType,
    pub range: MonthRange,
    pub attempts: u32,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub fn rows(&self) -> &[TrafficRecord] {
        match &self.outcome {
            UnitOutcome::Data(rows) => rows,
            _ => &[],
        }
    }

    /// User-facing warning for empty or failed units.
    pub fn message(&self) -> Option<String> {
        match &self.outcome {
            UnitOutcome::Data(_) => None,
            UnitOutcome::Empty => Some(format!(
                "No data found for {} ({}) for {}.",
                self.domain, self.traffic_type, self.range.start
            )),
            UnitOutcome::Failed(e) => Some(format!(
                "Error fetching data for {} ({}) for {}: {}",
                self.domain, self.traffic_type, self.range.start, e
            )),
        }
    }
}

impl fmt::Display for UnitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(&message),
            None => write!(
                f,
                "{} ({}) for {}: {} rows",
                self.domain,
                self.traffic_type,
                self.range.start,
                self.rows().len()
            ),
        }
    }
}

/// Issues one provider query per (domain, month) and normalizes the answers.
///
/// The collector only owns the transport side. Credential, traffic type and
/// row limit always come from the [`RunRequest`] being served.
pub struct Collector<S, Z = ThreadSleeper> {
    source: S,
    sleeper: Z,
    policy: RetryPolicy,
    provenance: Option<String>,
}

impl<S: TrafficSource> Collector<S, ThreadSleeper> {
    pub fn new(source: S) -> Self {
        Collector::with_sleeper(source, ThreadSleeper)
    }
}

impl<S: TrafficSource, Z: Sleeper> Collector<S, Z> {
    pub fn with_sleeper(source: S, sleeper: Z) -> Self {
        Collector {
            source,
            sleeper,
            policy: RetryPolicy::default(),
            provenance: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Value written to the `api_key` column instead of the request credential.
    pub fn with_provenance(mut self, provenance: &str) -> Self {
        self.provenance = Some(provenance.to_string());
        self
    }

    fn provenance<'a>(&'a self, request: &'a RunRequest) -> &'a str {
        self.provenance.as_deref().unwrap_or(&request.credential)
    }

    /// Runs a single unit to completion, including the rate-limit retry.
    pub fn fetch_unit(&self, request: &RunRequest, domain: &str, range: MonthRange) -> UnitReport {
        let traffic_type = request.traffic_type;
        let query = TrafficQuery::new(domain, &request.credential, traffic_type, range, request.limit);
        let start_time = Instant::now();

        let mut made = 0;
        let result = self.policy.run(
            &self.sleeper,
            |attempt| {
                made = attempt;
                self.source.fetch(&query)
            },
            |r: &ProviderResponse| r.status,
        );

        let (outcome, attempts) = match result {
            Ok((response, attempts)) => (self.interpret(request, domain, range, response), attempts),
            Err(e) => (UnitOutcome::Failed(e), made),
        };

        let report = UnitReport {
            domain: domain.to_string(),
            traffic_type,
            range,
            attempts,
            outcome,
        };

        match &report.outcome {
            UnitOutcome::Data(rows) => info!(
                action = "complete",
                component = "collector",
                domain,
                month = %range.start,
                traffic_type = %traffic_type,
                rows = rows.len(),
                attempts,
                duration_ms = start_time.elapsed().as_millis(),
                "Fetched traffic records"
            ),
            UnitOutcome::Empty => warn!(
                action = "complete",
                component = "collector",
                domain,
                month = %range.start,
                traffic_type = %traffic_type,
                "No data found"
            ),
            UnitOutcome::Failed(e) => error!(
                action = "complete",
                component = "collector",
                domain,
                month = %range.start,
                traffic_type = %traffic_type,
                attempts,
                error = %e,
                "Error fetching data"
            ),
        }
        report
    }

    fn interpret(&self, request: &RunRequest, domain: &str, range: MonthRange, response: ProviderResponse) -> UnitOutcome {
        if !response.is_success() {
            // A 429 that survived the retry lands here as an ordinary failure.
            return UnitOutcome::Failed(FetchError::RequestFailed {
                status: response.status,
            });
        }

        let payload: ProviderPayload = match serde_json::from_str(&response.body) {
            Ok(payload) => payload,
            Err(e) => return UnitOutcome::Failed(FetchError::Decode(e.to_string())),
        };

        let provenance = self.provenance(request);
        match payload.records {
            Some(records) if !records.is_empty() => UnitOutcome::Data(
                records
                    .into_iter()
                    .map(|record| TaggedRecord::new(domain, request.traffic_type, range, record).select_columns(provenance))
                    .collect(),
            ),
            _ => UnitOutcome::Empty,
        }
    }

    /// Lazily yields one report per requested domain, in input order, for a single month.
    pub fn batches<'a>(&'a self, request: &'a RunRequest, range: MonthRange) -> impl Iterator<Item = UnitReport> + 'a {
        request
            .domains
            .iter()
            .map(move |domain| self.fetch_unit(request, domain, range))
    }

    /// Same units as [`Collector::batches`], fetched on a rayon pool. Report order
    /// still follows the request's domains.
    pub fn collect_parallel(&self, request: &RunRequest, range: MonthRange, workers: usize) -> Vec<UnitReport> {
        let workers = workers.max(1);
        info!(
            action = "configure",
            component = "collector",
            worker_count = workers,
            domain_count = request.domains.len(),
            "Fetching domains in parallel"
        );

        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| {
                request
                    .domains
                    .par_iter()
                    .map(|domain| self.fetch_unit(request, domain, range))
                    .collect()
            }),
            Err(e) => {
                warn!(action = "configure", component = "collector", error = %e, "Falling back to sequential fetching");
                self.batches(request, range).collect()
            }
        }
    }

    /// Fetches every domain for one month and returns the combined rows, or
    /// `None` when no domain produced any.
    pub fn fetch(&self, request: &RunRequest, range: MonthRange) -> Option<TrafficTable> {
        let mut table = TrafficTable::new();
        for report in self.batches(request, range) {
            if let UnitOutcome::Data(rows) = report.outcome {
                table.append(rows);
            }
        }
        if table.is_empty() {
            None
        } else {
            Some(table)
        }
    }
}
