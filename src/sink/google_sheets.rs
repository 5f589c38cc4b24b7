use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::Sink;
use crate::error::{SinkError, SinkResult};
use crate::traffic::{TrafficRecord, TrafficTable};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets over the v4 REST API, authorized with a caller-supplied bearer token.
pub struct GoogleSheetsSink {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheetsSink {
    pub fn new(spreadsheet_id: &str, token: &str, timeout: Duration) -> SinkResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: SHEETS_API.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// `{base}/{spreadsheet}/values/{range}[:suffix]`
    pub fn values_url(&self, range: &str, suffix: &str) -> SinkResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SinkError::Transport(format!("invalid sheets url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SinkError::Transport(format!("sheets url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    fn has_header(&self, sheet: &str) -> SinkResult<bool> {
        let url = self.values_url(&a1_range(sheet, "1:1"), "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        let range: ValueRange = Self::check(response)?
            .json()
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;
        Ok(first_row_present(&range.values))
    }

    fn append_values(&self, sheet: &str, values: Vec<Vec<Value>>) -> SinkResult<()> {
        let mut url = self.values_url(&a1_range(sheet, "A1"), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": values }))
            .send()
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;
        Self::check(response)?;
        Ok(())
    }

    fn check(response: reqwest::blocking::Response) -> SinkResult<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SinkError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

/// `'{sheet}'!{cells}`, with quotes inside the sheet name doubled.
pub fn a1_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

fn first_row_present(values: &[Vec<Value>]) -> bool {
    values.first().is_some_and(|row| {
        row.iter()
            .any(|cell| !matches!(cell, Value::Null) && cell.as_str() != Some(""))
    })
}

/// Row as JSON cells: numbers stay numbers, missing values become empty strings.
pub fn row_values(row: &TrafficRecord) -> Vec<Value> {
    fn number(value: Option<f64>) -> Value {
        value.map(|v| json!(v)).unwrap_or_else(|| json!(""))
    }

    vec![
        json!(row.domain),
        json!(row.country_name.clone().unwrap_or_default()),
        json!(row.start_date.to_string()),
        json!(row.end_date.to_string()),
        number(row.share),
        number(row.visits),
        json!(row.api_key),
    ]
}

impl Sink for GoogleSheetsSink {
    fn append(&mut self, sheet: &str, rows: &[TrafficRecord]) -> SinkResult<()> {
        if sheet.is_empty() {
            return Err(SinkError::InvalidSheet(sheet.to_string()));
        }

        if !self.has_header(sheet)? {
            debug!(action = "header", component = "sheets_sink", sheet, "Writing header row");
            let header: Vec<Value> = TrafficTable::COLUMNS.iter().map(|c| json!(c)).collect();
            self.append_values(sheet, vec![header])?;
        }

        if !rows.is_empty() {
            self.append_values(sheet, rows.iter().map(row_values).collect())?;
        }

        info!(action = "append", component = "sheets_sink", sheet, rows = rows.len(), "Rows appended");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}
