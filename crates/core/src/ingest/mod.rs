pub mod provider;
pub mod sharesansar;

pub use provider::QuoteSource;
pub use sharesansar::{parse_live_trading_table, ShareSansarClient};
