use crate::domain::market::Quote;
use crate::error::QuoteFetchError;

/// A source of last traded prices, fetched once per run.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteFetchError>;
}

/// Fixed quotes, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    quotes: Vec<Quote>,
}

impl StaticQuoteSource {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }
}

#[async_trait::async_trait]
impl QuoteSource for StaticQuoteSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteFetchError> {
        Ok(self.quotes.clone())
    }
}
