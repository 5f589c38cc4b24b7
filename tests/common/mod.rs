#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use geoshare::error::{FetchError, SinkResult};
use geoshare::provider::{ProviderResponse, TrafficQuery, TrafficSource};
use geoshare::retry::Sleeper;
use geoshare::sink::Sink;
use geoshare::TrafficRecord;

/// Answers queries from per-domain scripts and records every call.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, Vec<ProviderResponse>>>,
    fallback: Option<ProviderResponse>,
    pub calls: Mutex<Vec<TrafficQuery>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses for `domain`, consumed in order.
    pub fn script(self, domain: &str, responses: Vec<ProviderResponse>) -> Self {
        self.scripts.lock().unwrap().insert(domain.to_string(), responses);
        self
    }

    /// Used once a domain's script is exhausted.
    pub fn fallback(mut self, response: ProviderResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, domain: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|q| q.domain == domain).count()
    }
}

impl TrafficSource for ScriptedSource {
    fn fetch(&self, query: &TrafficQuery) -> Result<ProviderResponse, FetchError> {
        self.calls.lock().unwrap().push(query.clone());
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&query.domain) {
            Some(responses) if !responses.is_empty() => Ok(responses.remove(0)),
            _ => self
                .fallback
                .clone()
                .ok_or_else(|| FetchError::Transport(format!("no scripted response for {}", query.domain))),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// One in-memory sheet: the header row, once written, and every appended row.
#[derive(Default)]
pub struct MemorySheet {
    pub header: Vec<String>,
    pub rows: Vec<TrafficRecord>,
}

/// Keeps every appended batch in memory, per sheet.
#[derive(Default)]
pub struct MemorySink {
    pub sheets: HashMap<String, MemorySheet>,
    pub appends: usize,
    pub fail: bool,
}

impl Sink for MemorySink {
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()> {
        if self.fail {
            return Err(geoshare::error::SinkError::Transport("sink offline".into()));
        }
        self.appends += 1;
        let values = self.sheets.entry(sheet.to_string()).or_default();
        if values.header.is_empty() {
            values.header = geoshare::TrafficTable::COLUMNS.iter().map(|c| c.to_string()).collect();
        }
        values.rows.extend(rows.iter().cloned());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

pub fn status(code: u16) -> ProviderResponse {
    ProviderResponse {
        status: code,
        body: String::new(),
    }
}

pub fn records(countries: &[(&str, f64, f64)]) -> ProviderResponse {
    let records: Vec<serde_json::Value> = countries
        .iter()
        .map(|(name, share, visits)| serde_json::json!({ "country_name": name, "share": share, "visits": visits }))
        .collect();
    ProviderResponse {
        status: 200,
        body: serde_json::json!({ "records": records }).to_string(),
    }
}

pub fn empty() -> ProviderResponse {
    ProviderResponse {
        status: 200,
        body: r#"{"records": []}"#.to_string(),
    }
}
