use crate::engine::AnalysisReport;
use crate::schema::Transaction;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Stable fingerprint of a normalized transaction set, used as the cache
/// key. Floats are hashed by bit pattern; identical inputs always produce
/// the same key.
pub fn fingerprint(transactions: &[Transaction]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for txn in transactions {
        txn.date.hash(&mut hasher);
        txn.action.hash(&mut hasher);
        txn.ticker.hash(&mut hasher);
        txn.quantity.to_bits().hash(&mut hasher);
        txn.price.to_bits().hash(&mut hasher);
        txn.amount.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Whole-result cache for analysis runs, keyed by input identity.
///
/// There are no concurrent writers, so invalidation is wholesale: an
/// explicit [`clear`](AnalysisCache::clear) drops everything. A cached
/// report is only valid as long as the market-data snapshot behind it;
/// the caller decides when that assumption has expired.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<u64, AnalysisReport>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, transactions: &[Transaction]) -> Option<&AnalysisReport> {
        self.entries.get(&fingerprint(transactions))
    }

    pub fn insert(&mut self, transactions: &[Transaction], report: AnalysisReport) {
        self.entries.insert(fingerprint(transactions), report);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(ticker: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            action: "Buy".to_string(),
            ticker: ticker.to_string(),
            quantity: 1.0,
            price: 0.0,
            amount,
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_input_sensitive() {
        let a = vec![txn("TSLY", -10.0)];
        let b = vec![txn("TSLY", -10.0)];
        let c = vec![txn("TSLY", -10.01)];

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_cache_roundtrip_and_clear() {
        let txns = vec![txn("TSLY", -10.0)];
        let mut cache = AnalysisCache::new();
        assert!(cache.get(&txns).is_none());

        cache.insert(&txns, AnalysisReport::default());
        assert!(cache.get(&txns).is_some());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&txns).is_none());
    }
}
