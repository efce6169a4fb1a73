//! Time-ordered series with optionally absent values

use serde::{Deserialize, Serialize};

/// One point of a derived series; `value` is None when not measurable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<K> {
    pub key: K,
    pub value: Option<f64>,
}

/// Points ordered by strictly increasing key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries<K> {
    points: Vec<SeriesPoint<K>>,
}

impl<K: Ord + Copy> DerivedSeries<K> {
    /// Build a series; points are sorted by key and a repeated key keeps its last value
    pub fn from_points<I: IntoIterator<Item = (K, Option<f64>)>>(points: I) -> Self {
        let mut points: Vec<SeriesPoint<K>> = points
            .into_iter()
            .map(|(key, value)| SeriesPoint { key, value })
            .collect();
        points.sort_by(|a, b| a.key.cmp(&b.key));
        points.reverse();
        points.dedup_by(|next, kept| next.key == kept.key);
        points.reverse();
        Self { points }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint<K>> {
        self.points.iter()
    }

    /// Value at `key`: None if the key is not in the series, Some(None) if it is absent
    pub fn get(&self, key: &K) -> Option<Option<f64>> {
        self.points
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Value at `key`, treating a missing key like an absent value
    pub fn value_at(&self, key: &K) -> Option<f64> {
        self.get(key).flatten()
    }

    /// Points that carry a value
    pub fn present(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.points.iter().filter_map(|p| p.value.map(|v| (p.key, v)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
