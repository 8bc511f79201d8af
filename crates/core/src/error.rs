//! Error taxonomy for a tracker run.
//!
//! Every variant is terminal for the run that produced it: nothing is retried
//! and no partial snapshot is ever returned alongside an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BandStoreLoadError {
    #[error("failed to read band store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open spreadsheet {path}: {source}")]
    Spreadsheet {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {0} has no worksheets")]
    NoWorksheet(String),

    #[error("failed to parse CSV band store: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported band store format: {0}")]
    UnsupportedFormat(String),

    #[error("band store has no header row")]
    NoHeader,

    #[error("band store is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("band store contains no valid rows")]
    Empty,
}

#[derive(Debug, Error)]
pub enum QuoteFetchError {
    #[error("failed to build live quote http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("live quote request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("live quote source returned HTTP {status}")]
    Status { status: reqwest::StatusCode },

    #[error("failed to read live quote response: {0}")]
    Body(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    BandStore(#[from] BandStoreLoadError),

    #[error(transparent)]
    QuoteFetch(#[from] QuoteFetchError),

    #[error("no live data fetched; check the live data source")]
    EmptyQuoteResult,
}

impl TrackerError {
    /// Warning-level outcomes end the run cleanly instead of failing it.
    pub fn is_warning(&self) -> bool {
        matches!(self, TrackerError::EmptyQuoteResult)
    }
}
