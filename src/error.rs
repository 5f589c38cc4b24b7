use thiserror::Error;

/// Month range planning failures. Both abort a run before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("incorrect date format '{0}', use YYYY-MM")]
    Format(String),
    #[error("start month {start} must be before or equal to end month {end}")]
    Order { start: String, end: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("an API key is required")]
    MissingCredential,
    #[error("no valid domains provided")]
    NoDomains,
    #[error("both a start and an end month are required")]
    MissingDates,
    #[error("row limit must be at least 1")]
    InvalidLimit,
}

/// Failure of a single (domain, month) unit. Rate limiting is absorbed by the
/// retry policy and only shows up here as `RequestFailed { status: 429 }`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status}")]
    RequestFailed { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Status code carried by the failure, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("sheets api returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid sheet name '{0}'")]
    InvalidSheet(String),
}

pub type SinkResult<T> = Result<T, SinkError>;
