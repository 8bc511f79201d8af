use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::market::JoinedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Breakout")]
    Breakout,
    #[serde(rename = "ATH Breakout")]
    AthBreakout,
    #[serde(rename = "Breakdown")]
    Breakdown,
    #[serde(rename = "ATL Breakdown")]
    AtlBreakdown,
    #[serde(rename = "High")]
    WatchHigh,
    #[serde(rename = "Low")]
    WatchLow,
}

/// The output table a category is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTable {
    Breakout,
    Breakdown,
    Watchlist,
}

impl Category {
    pub fn table(self) -> SignalTable {
        match self {
            Category::Breakout | Category::AthBreakout => SignalTable::Breakout,
            Category::Breakdown | Category::AtlBreakdown => SignalTable::Breakdown,
            Category::WatchHigh | Category::WatchLow => SignalTable::Watchlist,
        }
    }

    /// Value shown in the `Type` column.
    pub fn label(self) -> &'static str {
        match self {
            Category::Breakout => "Breakout",
            Category::AthBreakout => "ATH Breakout",
            Category::Breakdown => "Breakdown",
            Category::AtlBreakdown => "ATL Breakdown",
            Category::WatchHigh => "High",
            Category::WatchLow => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutRow {
    pub symbol: String,
    pub ltp: f64,
    pub high: f64,
    #[serde(rename = "type")]
    pub kind: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub symbol: String,
    pub ltp: f64,
    pub bottom: f64,
    #[serde(rename = "type")]
    pub kind: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRow {
    pub symbol: String,
    pub ltp: f64,
    pub bottom: f64,
    pub high: f64,
    #[serde(rename = "type")]
    pub kind: Category,
}

/// The three disjoint result tables of a classification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classified {
    pub breakouts: Vec<BreakoutRow>,
    pub breakdowns: Vec<BreakdownRow>,
    pub watchlist: Vec<WatchlistRow>,
}

impl Classified {
    pub fn push(&mut self, record: &JoinedRecord, category: Category) {
        let symbol = record.symbol.clone();
        let ltp = record.ltp;
        let band = &record.band;
        match category.table() {
            SignalTable::Breakout => self.breakouts.push(BreakoutRow {
                symbol,
                ltp,
                high: band.high,
                kind: category,
            }),
            SignalTable::Breakdown => self.breakdowns.push(BreakdownRow {
                symbol,
                ltp,
                bottom: band.bottom,
                kind: category,
            }),
            SignalTable::Watchlist => self.watchlist.push(WatchlistRow {
                symbol,
                ltp,
                bottom: band.bottom,
                high: band.high,
                kind: category,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.breakouts.len() + self.breakdowns.len() + self.watchlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub quotes_fetched: usize,
    pub bands_loaded: usize,
    pub records_joined: usize,
    #[serde(flatten)]
    pub signals: Classified,
}
