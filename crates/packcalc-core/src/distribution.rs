//! # Pack Distribution
//!
//! How many packs of each size a computation chose.

use std::collections::BTreeMap;

use serde::Serialize;

/// Mapping from pack size to the number of packs of that size.
///
/// Sizes with a zero count are never stored. Serializes as a JSON object
/// keyed by pack size in ascending order, e.g. `{"250":1,"500":1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PackDistribution(BTreeMap<i64, u64>);

impl PackDistribution {
    /// An empty distribution (zero packs).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add one pack of `size`.
    pub(crate) fn add_pack(&mut self, size: i64) {
        *self.0.entry(size).or_insert(0) += 1;
    }

    /// Number of packs of `size` (zero if the size is unused).
    pub fn count(&self, size: i64) -> u64 {
        self.0.get(&size).copied().unwrap_or(0)
    }

    /// Iterate `(size, count)` pairs in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.0.iter().map(|(&size, &count)| (size, count))
    }

    /// Number of distinct sizes used.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no packs are used.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of packs.
    pub fn total_packs(&self) -> u64 {
        self.0.values().sum()
    }

    /// Total number of items held by all packs.
    pub fn total_items(&self) -> i64 {
        self.0
            .iter()
            .map(|(&size, &count)| size * count as i64)
            .sum()
    }

    /// Items requested but not covered by this distribution.
    ///
    /// Always zero for a distribution returned by the engine.
    pub fn remainder(&self, requested: i64) -> i64 {
        requested - self.total_items()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<i64, u64> {
        &self.0
    }
}

impl From<BTreeMap<i64, u64>> for PackDistribution {
    fn from(mut map: BTreeMap<i64, u64>) -> Self {
        map.retain(|_, count| *count > 0);
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_remainder() {
        let mut d = PackDistribution::new();
        d.add_pack(500);
        d.add_pack(250);
        assert_eq!(d.total_packs(), 2);
        assert_eq!(d.total_items(), 750);
        assert_eq!(d.remainder(750), 0);
        assert_eq!(d.remainder(800), 50);
    }

    #[test]
    fn counts_repeated_sizes() {
        let mut d = PackDistribution::new();
        for _ in 0..10 {
            d.add_pack(100);
        }
        assert_eq!(d.count(100), 10);
        assert_eq!(d.count(250), 0);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn empty_distribution() {
        let d = PackDistribution::new();
        assert!(d.is_empty());
        assert_eq!(d.total_packs(), 0);
        assert_eq!(d.total_items(), 0);
    }

    #[test]
    fn from_map_drops_zero_counts() {
        let map = BTreeMap::from([(250, 0), (500, 2)]);
        let d = PackDistribution::from(map);
        assert_eq!(d.len(), 1);
        assert_eq!(d.count(500), 2);
    }

    #[test]
    fn serializes_with_string_keys_in_ascending_order() {
        let d = PackDistribution::from(BTreeMap::from([(53, 9429), (23, 2), (31, 7)]));
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"23":2,"31":7,"53":9429}"#);
    }
}
