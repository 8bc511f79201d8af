pub mod bands;
pub mod classify;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod join;
pub mod pipeline;

pub mod config {
    use crate::classify::{Thresholds, DEFAULT_WATCH_PROXIMITY};
    use anyhow::Context;

    pub const DEFAULT_BANDS_PATH: &str = "data.xlsx";
    pub const DEFAULT_LIVE_TRADING_URL: &str = "https://www.sharesansar.com/live-trading";
    pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub bands_path: String,
        pub live_trading_url: String,
        pub live_fetch_timeout_secs: u64,
        pub watch_proximity: f64,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_vars(|key| std::env::var(key).ok())
        }

        pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let non_empty = |key: &str| var(key).filter(|s| !s.trim().is_empty());

            let live_fetch_timeout_secs = match non_empty("LIVE_FETCH_TIMEOUT_SECS") {
                Some(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("LIVE_FETCH_TIMEOUT_SECS is not a number: {s}"))?,
                None => DEFAULT_FETCH_TIMEOUT_SECS,
            };
            anyhow::ensure!(
                live_fetch_timeout_secs >= 1,
                "LIVE_FETCH_TIMEOUT_SECS must be >= 1"
            );

            let watch_proximity = match non_empty("WATCH_PROXIMITY") {
                Some(s) => s
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("WATCH_PROXIMITY is not a number: {s}"))?,
                None => DEFAULT_WATCH_PROXIMITY,
            };
            anyhow::ensure!(
                watch_proximity > 0.0 && watch_proximity < 1.0,
                "WATCH_PROXIMITY must be between 0 and 1 (got {watch_proximity})"
            );

            Ok(Self {
                bands_path: non_empty("BANDS_PATH").unwrap_or_else(|| DEFAULT_BANDS_PATH.to_string()),
                live_trading_url: non_empty("LIVE_TRADING_URL")
                    .unwrap_or_else(|| DEFAULT_LIVE_TRADING_URL.to_string()),
                live_fetch_timeout_secs,
                watch_proximity,
                sentry_dsn: non_empty("SENTRY_DSN"),
            })
        }

        pub fn thresholds(&self) -> Thresholds {
            Thresholds {
                watch_proximity: self.watch_proximity,
            }
        }
    }

}
