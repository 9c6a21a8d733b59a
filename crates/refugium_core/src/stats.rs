//! Small numeric helpers shared by the engine and its analytics.

use std::collections::HashMap;

/// Clamps `value` into `[min, max]`, resolving NaN to `min`.
#[inline]
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[must_use]
pub fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Counts keyed by id, iterated in first-seen order.
///
/// Float sums built from a tally stay reproducible because the iteration
/// order only depends on the order keys were first inserted.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    order: Vec<(u64, usize)>,
    index: HashMap<u64, usize>,
}

impl Tally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I: IntoIterator<Item = u64>>(keys: I) -> Self {
        let mut tally = Self::new();
        for key in keys {
            tally.add(key, 1);
        }
        tally
    }

    pub fn add(&mut self, key: u64, amount: usize) {
        match self.index.get(&key) {
            Some(&slot) => self.order[slot].1 += amount,
            None => {
                self.index.insert(key, self.order.len());
                self.order.push((key, amount));
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: u64) -> usize {
        self.index.get(&key).map_or(0, |&slot| self.order[slot].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.order.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.order.iter().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.order.iter().map(|(key, _)| *key)
    }

    /// Highest count, ties resolved toward the lowest id. Returns `(0, 0)` when empty.
    #[must_use]
    pub fn dominant(&self) -> (u64, usize) {
        let mut best = (0, 0);
        for (key, count) in self.iter() {
            if count > best.1 || (count == best.1 && (best.0 == 0 || key < best.0)) {
                best = (key, count);
            }
        }
        best
    }
}
