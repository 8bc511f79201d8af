use serde::{Deserialize, Serialize};

/// One row of the live-trading table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    /// Last traded price; `None` when the source cell could not be parsed.
    pub ltp: Option<f64>,
}

impl Quote {
    pub fn new(symbol: impl AsRef<str>, ltp: Option<f64>) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_string(),
            ltp,
        }
    }
}

/// Reference price levels for a symbol, maintained outside this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub symbol: String,
    pub bottom: f64,
    pub high: f64,
    pub ath: f64,
    pub atl: f64,
}

/// A symbol present in both the live quotes and the band store, with a usable price.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub symbol: String,
    pub ltp: f64,
    pub band: Band,
}
