pub mod loader;

use crate::domain::market::Band;
use std::collections::HashMap;

pub use loader::{load_band_table, load_band_table_csv};

/// Read-only view over the reference bands, keyed by symbol.
pub trait BandRepository: Send + Sync {
    fn get(&self, symbol: &str) -> Option<&Band>;

    /// All bands in the order the store holds them.
    fn bands(&self) -> &[Band];

    fn len(&self) -> usize {
        self.bands().len()
    }

    fn is_empty(&self) -> bool {
        self.bands().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BandTable {
    bands: Vec<Band>,
    index: HashMap<String, usize>,
}

impl BandTable {
    /// Builds a table, keeping the first band seen for each symbol.
    pub fn from_bands(bands: impl IntoIterator<Item = Band>) -> Self {
        let mut table = Self::default();
        for band in bands {
            if table.index.contains_key(&band.symbol) {
                tracing::warn!(symbol = %band.symbol, "duplicate symbol in band store; keeping first row");
                continue;
            }
            table.index.insert(band.symbol.clone(), table.bands.len());
            table.bands.push(band);
        }
        table
    }
}

impl BandRepository for BandTable {
    fn get(&self, symbol: &str) -> Option<&Band> {
        self.index.get(symbol).map(|&i| &self.bands[i])
    }

    fn bands(&self) -> &[Band] {
        &self.bands
    }
}
