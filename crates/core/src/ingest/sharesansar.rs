//! ShareSansar live-trading page.
//!
//! The page renders one `table#headFixed` whose rows are
//! `S.No | Symbol | LTP | ...`. Only the symbol and LTP columns are read.

use std::collections::HashSet;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::config::Settings;
use crate::domain::market::Quote;
use crate::error::QuoteFetchError;
use crate::ingest::provider::QuoteSource;

const SYMBOL_CELL: usize = 1;
const LTP_CELL: usize = 2;

#[derive(Debug, Clone)]
pub struct ShareSansarClient {
    http: reqwest::Client,
    url: String,
}

impl ShareSansarClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, QuoteFetchError> {
        Self::new(
            &settings.live_trading_url,
            Duration::from_secs(settings.live_fetch_timeout_secs),
        )
    }

    pub fn new(url: &str, timeout: Duration) -> Result<Self, QuoteFetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nepse-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(QuoteFetchError::Client)?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl QuoteSource for ShareSansarClient {
    fn source_name(&self) -> &'static str {
        "sharesansar"
    }

    async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteFetchError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(QuoteFetchError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(QuoteFetchError::Status { status });
        }

        let html = res.text().await.map_err(QuoteFetchError::Body)?;
        let quotes = parse_live_trading_table(&html);
        tracing::info!(url = %self.url, quotes = quotes.len(), "fetched live trading table");
        Ok(quotes)
    }
}

/// Extracts `{symbol, ltp}` rows from the live-trading page.
///
/// A page without the table yields no quotes. Rows with fewer than three cells
/// or an empty symbol are skipped, an LTP that does not parse becomes `None`,
/// and only the first row of a repeated symbol is kept.
pub fn parse_live_trading_table(html: &str) -> Vec<Quote> {
    let document = Html::parse_document(html);
    let table_sel = selector("table#headFixed");
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let Some(table) = document.select(&table_sel).next() else {
        tracing::warn!("live trading table not found in page");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut quotes = Vec::new();
    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() <= LTP_CELL {
            continue;
        }

        let quote = Quote::new(
            cell_text(&cells[SYMBOL_CELL]),
            parse_price(&cell_text(&cells[LTP_CELL])),
        );
        if quote.symbol.is_empty() || !seen.insert(quote.symbol.clone()) {
            continue;
        }
        quotes.push(quote);
    }

    quotes
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>()
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}
