//! Loaders for the reference band file.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read from their
//! first worksheet; `.csv` files are read as-is. Both must carry a header row
//! naming at least [`REQUIRED_COLUMNS`]; other columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::bands::{BandRepository, BandTable};
use crate::domain::market::Band;
use crate::error::BandStoreLoadError;

pub const REQUIRED_COLUMNS: [&str; 5] = ["Symbol", "Bottom", "High", "ATH", "ATL"];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn load_band_table(path: impl AsRef<Path>) -> Result<BandTable, BandStoreLoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        load_spreadsheet(path)?
    } else if ext == "csv" {
        let file = File::open(path).map_err(|source| BandStoreLoadError::Io {
            path: shown.clone(),
            source,
        })?;
        load_band_table_csv(file)?
    } else {
        return Err(BandStoreLoadError::UnsupportedFormat(shown));
    };

    tracing::info!(path = %shown, bands = table.len(), "loaded band store");
    Ok(table)
}

pub fn load_band_table_csv<R: Read>(reader: R) -> Result<BandTable, BandStoreLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(BandStoreLoadError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect::<Vec<_>>());
    }

    build_table(&header, rows)
}

fn load_spreadsheet(path: &Path) -> Result<BandTable, BandStoreLoadError> {
    let shown = path.display().to_string();

    // calamine folds a missing file into its own error type; surface it as IO.
    std::fs::metadata(path).map_err(|source| BandStoreLoadError::Io {
        path: shown.clone(),
        source,
    })?;

    let mut workbook = open_workbook_auto(path).map_err(|source| BandStoreLoadError::Spreadsheet {
        path: shown.clone(),
        source,
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BandStoreLoadError::NoWorksheet(shown.clone()))?
        .map_err(|source| BandStoreLoadError::Spreadsheet {
            path: shown.clone(),
            source,
        })?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or(BandStoreLoadError::NoHeader)?
        .iter()
        .map(|c| Cell::from(c).as_text())
        .collect();

    build_table(
        &header,
        rows.map(|row| row.iter().map(Cell::from).collect::<Vec<_>>()),
    )
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn as_text(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.replace(',', "").trim().parse::<f64>().ok()?,
            Cell::Empty => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::String(s) => Cell::from_text(s),
            other => Cell::from_text(&other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    symbol: usize,
    bottom: usize,
    high: usize,
    ath: usize,
    atl: usize,
}

impl ColumnIndex {
    fn resolve(header: &[String]) -> Result<Self, BandStoreLoadError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let found: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|&c| find(c)).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&found)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BandStoreLoadError::MissingColumns(missing));
        }

        let idx: Vec<usize> = found.into_iter().flatten().collect();
        Ok(Self {
            symbol: idx[0],
            bottom: idx[1],
            high: idx[2],
            ath: idx[3],
            atl: idx[4],
        })
    }

    fn band(&self, row: &[Cell]) -> Option<Band> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or(Cell::Empty);

        let symbol = cell(self.symbol).as_text();
        if symbol.is_empty() {
            return None;
        }

        Some(Band {
            symbol,
            bottom: cell(self.bottom).as_number()?,
            high: cell(self.high).as_number()?,
            ath: cell(self.ath).as_number()?,
            atl: cell(self.atl).as_number()?,
        })
    }
}

fn build_table(
    header: &[String],
    rows: impl IntoIterator<Item = Vec<Cell>>,
) -> Result<BandTable, BandStoreLoadError> {
    let columns = ColumnIndex::resolve(header)?;

    let mut bands = Vec::new();
    let mut dropped: usize = 0;
    for (idx, row) in rows.into_iter().enumerate() {
        if row.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        match columns.band(&row) {
            Some(band) => bands.push(band),
            None => {
                dropped += 1;
                // Row numbers are 1-based and count the header.
                tracing::warn!(row = idx + 2, "dropping unparsable band row");
            }
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = bands.len(), "band store rows dropped");
    }
    if bands.is_empty() {
        return Err(BandStoreLoadError::Empty);
    }

    Ok(BandTable::from_bands(bands))
}
