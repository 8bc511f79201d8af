//! Band classification.
//!
//! Each record is run through [`RULES`] top to bottom and takes the category of
//! the first rule that matches. Rules are independent predicates, so a record
//! can never land in two tables.

use crate::domain::market::JoinedRecord;
use crate::domain::signal::{Category, Classified};

pub const DEFAULT_WATCH_PROXIMITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Maximum relative distance `|ltp - level| / level` for a watchlist entry.
    pub watch_proximity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            watch_proximity: DEFAULT_WATCH_PROXIMITY,
        }
    }
}

pub type RuleFn = fn(&JoinedRecord, &Thresholds) -> Option<Category>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub eval: RuleFn,
}

/// Evaluation order is the tie-break policy: breakouts win over breakdowns,
/// and proximity to High wins over proximity to Bottom.
pub const RULES: [Rule; 4] = [
    Rule {
        name: "breakout",
        eval: breakout,
    },
    Rule {
        name: "breakdown",
        eval: breakdown,
    },
    Rule {
        name: "watch_high",
        eval: watch_high,
    },
    Rule {
        name: "watch_low",
        eval: watch_low,
    },
];

pub fn classify_record(record: &JoinedRecord, thresholds: &Thresholds) -> Option<Category> {
    RULES.iter().find_map(|rule| (rule.eval)(record, thresholds))
}

/// Classifies every record, keeping input order within each output table.
pub fn classify(records: &[JoinedRecord], thresholds: &Thresholds) -> Classified {
    let mut out = Classified::default();
    for record in records {
        if let Some(category) = classify_record(record, thresholds) {
            tracing::trace!(symbol = %record.symbol, ltp = record.ltp, category = category.label(), "classified");
            out.push(record, category);
        }
    }
    out
}

// Comparisons stay in the positive form so a NaN level never matches.
fn breakout(r: &JoinedRecord, _: &Thresholds) -> Option<Category> {
    (r.ltp > r.band.high).then(|| {
        if r.ltp > r.band.ath {
            Category::AthBreakout
        } else {
            Category::Breakout
        }
    })
}

fn breakdown(r: &JoinedRecord, _: &Thresholds) -> Option<Category> {
    (r.ltp < r.band.bottom).then(|| {
        if r.ltp < r.band.atl {
            Category::AtlBreakdown
        } else {
            Category::Breakdown
        }
    })
}

fn watch_high(r: &JoinedRecord, t: &Thresholds) -> Option<Category> {
    proximity(r.ltp, r.band.high)
        .filter(|p| *p <= t.watch_proximity)
        .map(|_| Category::WatchHigh)
}

fn watch_low(r: &JoinedRecord, t: &Thresholds) -> Option<Category> {
    proximity(r.ltp, r.band.bottom)
        .filter(|p| *p <= t.watch_proximity)
        .map(|_| Category::WatchLow)
}

/// Relative distance from `level`; undefined for a non-positive or non-finite level.
fn proximity(price: f64, level: f64) -> Option<f64> {
    if !level.is_finite() || level <= 0.0 {
        return None;
    }
    Some((price - level).abs() / level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Band;

    fn record(symbol: &str, ltp: f64, bottom: f64, high: f64, ath: f64, atl: f64) -> JoinedRecord {
        JoinedRecord {
            symbol: symbol.to_string(),
            ltp,
            band: Band {
                symbol: symbol.to_string(),
                bottom,
                high,
                ath,
                atl,
            },
        }
    }

    fn cat(r: &JoinedRecord) -> Option<Category> {
        classify_record(r, &Thresholds::default())
    }

    #[test]
    fn breakout_below_ath() {
        let r = record("ABC", 105.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::Breakout));
    }

    #[test]
    fn breakout_at_ath_is_plain_breakout() {
        let r = record("ABC", 120.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::Breakout));
    }

    #[test]
    fn breakout_above_ath() {
        let r = record("XYZ", 130.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::AthBreakout));
    }

    #[test]
    fn breakdown_above_atl() {
        let r = record("DEF", 65.0, 70.0, 100.0, 120.0, 60.0);
        assert_eq!(cat(&r), Some(Category::Breakdown));
    }

    #[test]
    fn breakdown_at_atl_is_plain_breakdown() {
        let r = record("DEF", 60.0, 70.0, 100.0, 120.0, 60.0);
        assert_eq!(cat(&r), Some(Category::Breakdown));
    }

    #[test]
    fn breakdown_below_atl() {
        let r = record("DEF", 55.0, 70.0, 100.0, 120.0, 60.0);
        assert_eq!(cat(&r), Some(Category::AtlBreakdown));
    }

    #[test]
    fn watch_high_within_one_percent() {
        let r = record("GHI", 99.5, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::WatchHigh));
    }

    #[test]
    fn price_equal_to_high_is_watch_not_breakout() {
        let r = record("GHI", 100.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::WatchHigh));
    }

    #[test]
    fn watch_low_within_one_percent() {
        let r = record("JKL", 80.5, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::WatchLow));
    }

    #[test]
    fn high_wins_when_both_bands_are_close() {
        let r = record("MNO", 100.0, 99.5, 100.2, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::WatchHigh));
    }

    #[test]
    fn mid_band_is_unclassified() {
        let r = record("PQR", 90.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), None);
    }

    #[test]
    fn breakout_wins_over_breakdown_in_degenerate_band() {
        // High below Bottom: price satisfies both the breakout and breakdown predicates.
        let r = record("ODD", 90.0, 95.0, 85.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::Breakout));
    }

    #[test]
    fn zero_levels_never_match_watchlist() {
        let r = record("ZRO", 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(cat(&r), None);

        let r = record("ZRO", 0.004, 0.0, 0.0, 1.0, 0.0);
        assert_eq!(cat(&r), Some(Category::Breakout));
    }

    #[test]
    fn zero_bottom_disables_low_proximity_only() {
        let r = record("ZBT", 0.0, 0.0, 100.0, 120.0, 0.0);
        assert_eq!(cat(&r), None);

        let r = record("ZBT", 99.5, 0.0, 100.0, 120.0, 0.0);
        assert_eq!(cat(&r), Some(Category::WatchHigh));
    }

    #[test]
    fn one_percent_from_high_is_inclusive() {
        let r = record("EDG", 99.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), Some(Category::WatchHigh));

        let r = record("EDG", 98.99, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), None);
    }

    #[test]
    fn one_percent_from_bottom_is_inclusive() {
        let r = record("EDG", 101.0, 100.0, 200.0, 250.0, 90.0);
        assert_eq!(cat(&r), Some(Category::WatchLow));

        let r = record("EDG", 101.01, 100.0, 200.0, 250.0, 90.0);
        assert_eq!(cat(&r), None);
    }

    #[test]
    fn nan_levels_never_match() {
        let r = record("NAN", 90.0, 80.0, f64::NAN, 120.0, 70.0);
        assert_eq!(cat(&r), None);

        let r = record("NAN", 90.0, f64::NAN, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), None);

        // A NaN ATH only affects the sub-type, never the breakout itself.
        let r = record("NAN", 105.0, 80.0, 100.0, f64::NAN, 70.0);
        assert_eq!(cat(&r), Some(Category::Breakout));
    }

    #[test]
    fn custom_threshold_widens_watchlist() {
        let r = record("WID", 97.0, 80.0, 100.0, 120.0, 70.0);
        assert_eq!(cat(&r), None);
        let wide = Thresholds {
            watch_proximity: 0.05,
        };
        assert_eq!(classify_record(&r, &wide), Some(Category::WatchHigh));
    }

    #[test]
    fn every_record_lands_in_at_most_one_table() {
        let records: Vec<JoinedRecord> = (0..400)
            .map(|i| {
                let ltp = 50.0 + (i as f64) * 0.25;
                record(&format!("S{i}"), ltp, 70.0, 100.0, 120.0, 60.0)
            })
            .collect();

        let out = classify(&records, &Thresholds::default());
        let classified = records
            .iter()
            .filter(|r| cat(r).is_some())
            .count();
        assert_eq!(out.len(), classified);

        let mut seen = std::collections::HashSet::new();
        let symbols = out
            .breakouts
            .iter()
            .map(|r| &r.symbol)
            .chain(out.breakdowns.iter().map(|r| &r.symbol))
            .chain(out.watchlist.iter().map(|r| &r.symbol));
        for symbol in symbols {
            assert!(seen.insert(symbol.clone()), "{symbol} classified twice");
        }
    }

    #[test]
    fn classify_preserves_order_and_row_fields() {
        let records = vec![
            record("XYZ", 130.0, 80.0, 100.0, 120.0, 70.0),
            record("DEF", 65.0, 70.0, 100.0, 120.0, 60.0),
            record("ABC", 105.0, 80.0, 100.0, 120.0, 70.0),
            record("PQR", 90.0, 80.0, 100.0, 120.0, 70.0),
            record("GHI", 99.5, 80.0, 100.0, 120.0, 70.0),
        ];
        let out = classify(&records, &Thresholds::default());

        let breakouts: Vec<_> = out.breakouts.iter().map(|r| (r.symbol.as_str(), r.kind)).collect();
        assert_eq!(
            breakouts,
            vec![("XYZ", Category::AthBreakout), ("ABC", Category::Breakout)]
        );
        assert_eq!(out.breakouts[1].high, 100.0);

        assert_eq!(out.breakdowns.len(), 1);
        assert_eq!(out.breakdowns[0].bottom, 70.0);
        assert_eq!(out.breakdowns[0].kind, Category::Breakdown);

        assert_eq!(out.watchlist.len(), 1);
        assert_eq!(out.watchlist[0].symbol, "GHI");
        assert_eq!((out.watchlist[0].bottom, out.watchlist[0].high), (80.0, 100.0));
    }

    #[test]
    fn rule_order_is_fixed() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, ["breakout", "breakdown", "watch_high", "watch_low"]);
    }
}
