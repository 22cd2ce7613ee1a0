use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One day of market data for a ticker. `dividend` is the per-share cash
/// dividend paid that day (0.0 on most days); `split_ratio` is the
/// multiplicative split factor (0.0 when no split occurred, 2.0 for a
/// 2-for-1 forward split, 0.5 for a 1-for-2 reverse split).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDay {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub dividend: f64,
    #[serde(default)]
    pub split_ratio: f64,
}

/// Providers extend the requested window back by this many days so the
/// series is guaranteed to cover the first transaction.
pub const FETCH_BUFFER_DAYS: i64 = 10;

pub fn buffered_start(start_date: NaiveDate) -> NaiveDate {
    start_date - Duration::days(FETCH_BUFFER_DAYS)
}

/// The narrow seam to the external market-data collaborator.
///
/// An empty series is the "no data" sentinel; implementations must catch
/// their own fetch failures and return an empty vec rather than panic or
/// surface transport errors. The returned series is ordered by date.
pub trait MarketDataProvider {
    fn fetch(&self, ticker: &str, start_date: NaiveDate) -> Vec<MarketDay>;
}

impl<T: MarketDataProvider + ?Sized> MarketDataProvider for &T {
    fn fetch(&self, ticker: &str, start_date: NaiveDate) -> Vec<MarketDay> {
        (**self).fetch(ticker, start_date)
    }
}

/// In-memory provider backed by preloaded series. Serves tests and offline
/// runs; the real network-backed collaborator lives outside this crate.
#[derive(Debug, Clone, Default)]
pub struct FixedProvider {
    series: BTreeMap<String, Vec<MarketDay>>,
}

impl FixedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, ticker: &str, mut days: Vec<MarketDay>) -> Self {
        days.sort_by_key(|d| d.date);
        self.series.insert(ticker.to_string(), days);
        self
    }
}

impl MarketDataProvider for FixedProvider {
    fn fetch(&self, ticker: &str, start_date: NaiveDate) -> Vec<MarketDay> {
        let from = buffered_start(start_date);
        self.series
            .get(ticker)
            .map(|days| days.iter().filter(|d| d.date >= from).cloned().collect())
            .unwrap_or_default()
    }
}

/// Builds a flat daily series: constant price, no dividends, no splits.
/// Handy for tests that only care about cash-flow mechanics.
pub fn flat_series(start: NaiveDate, days: usize, close: f64) -> Vec<MarketDay> {
    (0..days)
        .map(|i| MarketDay {
            date: start + Duration::days(i as i64),
            close,
            dividend: 0.0,
            split_ratio: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fixed_provider_filters_by_buffered_start() {
        let provider = FixedProvider::new().with_series("TSLY", flat_series(d(2023, 1, 1), 30, 10.0));

        // Asking for Jan 20 must include the 10-day buffer back to Jan 10.
        let series = provider.fetch("TSLY", d(2023, 1, 20));
        assert_eq!(series.first().unwrap().date, d(2023, 1, 10));

        // Unknown ticker is the empty-series sentinel, not an error.
        assert!(provider.fetch("NOPE", d(2023, 1, 1)).is_empty());
    }

    #[test]
    fn test_with_series_sorts() {
        let provider = FixedProvider::new().with_series(
            "X",
            vec![
                MarketDay { date: d(2023, 1, 2), close: 2.0, dividend: 0.0, split_ratio: 0.0 },
                MarketDay { date: d(2023, 1, 1), close: 1.0, dividend: 0.0, split_ratio: 0.0 },
            ],
        );
        let series = provider.fetch("X", d(2023, 1, 1));
        assert_eq!(series[0].date, d(2023, 1, 1));
    }
}
