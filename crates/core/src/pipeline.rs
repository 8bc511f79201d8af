use chrono::Utc;

use crate::bands::BandRepository;
use crate::classify::{classify, Thresholds};
use crate::domain::signal::Snapshot;
use crate::error::TrackerError;
use crate::ingest::provider::QuoteSource;
use crate::join::join_records;

/// One tracker run: fetch live quotes, join them with the bands and classify.
///
/// Returns the complete snapshot or an error, never a partial result.
pub async fn run_snapshot<S, B>(
    source: &S,
    bands: &B,
    thresholds: &Thresholds,
) -> Result<Snapshot, TrackerError>
where
    S: QuoteSource + ?Sized,
    B: BandRepository + ?Sized,
{
    let quotes = source.fetch_quotes().await?;
    if quotes.is_empty() {
        tracing::warn!(source = source.source_name(), "live quote source returned no rows");
        return Err(TrackerError::EmptyQuoteResult);
    }

    let records = join_records(&quotes, bands);
    let signals = classify(&records, thresholds);

    tracing::info!(
        source = source.source_name(),
        quotes = quotes.len(),
        joined = records.len(),
        breakouts = signals.breakouts.len(),
        breakdowns = signals.breakdowns.len(),
        watchlist = signals.watchlist.len(),
        "classified live snapshot"
    );

    Ok(Snapshot {
        generated_at: Utc::now(),
        source: source.source_name().to_string(),
        quotes_fetched: quotes.len(),
        bands_loaded: bands.len(),
        records_joined: records.len(),
        signals,
    })
}
