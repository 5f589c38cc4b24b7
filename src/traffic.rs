use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::months::{MonthId, MonthRange};

/// Which provider metric variant to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TrafficType {
    #[value(name = "all_traffic", alias = "all-traffic")]
    AllTraffic,
    Desktop,
    Mobile,
}

impl TrafficType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficType::AllTraffic => "all_traffic",
            TrafficType::Desktop => "desktop",
            TrafficType::Mobile => "mobile",
        }
    }

    /// Remote path segment for this variant.
    pub fn endpoint(&self) -> &'static str {
        match self {
            TrafficType::AllTraffic => "geo/total-traffic-by-country",
            TrafficType::Desktop => "geo/traffic-by-country",
            TrafficType::Mobile => "geo/mobile-traffic-by-country",
        }
    }

    /// Capitalized label: first letter upper-cased, the rest lower-cased.
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider response body. A missing `records` key is treated like an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderPayload {
    #[serde(default)]
    pub records: Option<Vec<ProviderRecord>>,
}

/// One country-level record as returned by the provider. Values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderRecord {
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub share: Option<f64>,
    #[serde(default)]
    pub visits: Option<f64>,
}

/// Provider record tagged with provenance, before column selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub domain: String,
    pub traffic_type: String,
    pub start_date: MonthId,
    pub end_date: MonthId,
    pub record: ProviderRecord,
}

impl TaggedRecord {
    pub fn new(domain: &str, traffic_type: TrafficType, range: MonthRange, record: ProviderRecord) -> Self {
        TaggedRecord {
            domain: domain.to_string(),
            traffic_type: traffic_type.label(),
            start_date: range.start,
            end_date: range.end,
            record,
        }
    }

    /// Projects onto the output columns. The traffic type label is not one of them.
    pub fn select_columns(self, api_key: &str) -> TrafficRecord {
        TrafficRecord {
            domain: self.domain,
            country_name: self.record.country_name,
            start_date: self.start_date,
            end_date: self.end_date,
            share: self.record.share,
            visits: self.record.visits,
            api_key: api_key.to_string(),
        }
    }
}

/// One output row. Field order is the column order; `None` serializes as an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    pub domain: String,
    pub country_name: Option<String>,
    pub start_date: MonthId,
    pub end_date: MonthId,
    pub share: Option<f64>,
    pub visits: Option<f64>,
    pub api_key: String,
}

/// Ordered, append-only collection of rows. Never deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficTable {
    rows: Vec<TrafficRecord>,
}

impl TrafficTable {
    pub const COLUMNS: [&'static str; 7] = [
        "domain",
        "country_name",
        "start_date",
        "end_date",
        "share",
        "visits",
        "api_key",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, rows: impl IntoIterator<Item = TrafficRecord>) {
        self.rows.extend(rows);
    }

    pub fn extend(&mut self, other: TrafficTable) {
        self.rows.extend(other.rows);
    }

    pub fn rows(&self) -> &[TrafficRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<TrafficRecord> {
        self.rows
    }
}

impl From<Vec<TrafficRecord>> for TrafficTable {
    fn from(rows: Vec<TrafficRecord>) -> Self {
        TrafficTable { rows }
    }
}
