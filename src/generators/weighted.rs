//! Discrete distribution sampling over a cumulative weight table.

use rand::Rng;

use super::GeneratorError;

/// Samples entries with probability proportional to their weight.
///
/// Weights are stored as running sums; a single uniform draw in
/// `[0, total)` is resolved with a binary search over those sums.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    cumulative: Vec<f64>,
}

impl<T: Copy> WeightedTable<T> {
    /// Builds a table from `(item, weight)` pairs.
    pub fn new<I>(entries: I) -> Result<Self, GeneratorError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let mut items = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;

        for (item, weight) in entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GeneratorError::InvalidWeight { weight });
            }
            total += weight;
            items.push(item);
            cumulative.push(total);
        }

        if items.is_empty() {
            return Err(GeneratorError::EmptyWeightTable);
        }
        if total <= 0.0 {
            return Err(GeneratorError::ZeroTotalWeight);
        }
        if !total.is_finite() {
            return Err(GeneratorError::InvalidWeight { weight: total });
        }

        Ok(Self { items, cumulative })
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        // non-empty by construction
        self.cumulative.last().copied().unwrap_or_default()
    }

    /// Draws one entry.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let point = rng.gen_range(0.0..self.total());
        let idx = self.cumulative.partition_point(|&upper| upper <= point);
        // float rounding can push `point` onto the last boundary
        self.items[idx.min(self.items.len() - 1)]
    }
}
