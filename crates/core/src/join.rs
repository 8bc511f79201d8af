use std::collections::HashMap;

use crate::bands::BandRepository;
use crate::domain::market::{JoinedRecord, Quote};

/// Inner join of live quotes and reference bands on symbol.
///
/// Output follows the band store's order. Symbols missing from either side are
/// dropped, as are quotes without a finite price. A repeated quote symbol keeps
/// its first price.
pub fn join_records<B>(quotes: &[Quote], bands: &B) -> Vec<JoinedRecord>
where
    B: BandRepository + ?Sized,
{
    let mut prices: HashMap<&str, Option<f64>> = HashMap::with_capacity(quotes.len());
    for quote in quotes {
        prices.entry(quote.symbol.trim()).or_insert(quote.ltp);
    }

    let mut out = Vec::new();
    let mut unpriced: usize = 0;
    for band in bands.bands() {
        let Some(ltp) = prices.get(band.symbol.as_str()) else {
            continue;
        };
        match ltp {
            Some(ltp) if ltp.is_finite() => out.push(JoinedRecord {
                symbol: band.symbol.clone(),
                ltp: *ltp,
                band: band.clone(),
            }),
            _ => unpriced += 1,
        }
    }

    tracing::debug!(
        quotes = quotes.len(),
        bands = bands.len(),
        joined = out.len(),
        unpriced,
        "joined live quotes with band store"
    );
    out
}
