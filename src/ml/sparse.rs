//! Sparse feature vectors.

use serde::{Deserialize, Serialize};

/// A sparse vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(index, value)` pairs in any order.
    ///
    /// Duplicate indices are summed and zeros are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut pairs: Vec<(usize, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(idx);
                    values.push(value);
                }
            }
        }

        let mut vector = SparseVector { indices, values };
        vector.prune_zeros();
        vector
    }

    fn prune_zeros(&mut self) {
        let mut keep = 0;
        for i in 0..self.indices.len() {
            if self.values[i] != 0.0 {
                self.indices[keep] = self.indices[i];
                self.values[keep] = self.values[i];
                keep += 1;
            }
        }
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    /// Value at `index` (0 when not stored).
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Whether no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit Euclidean norm. Zero vectors are left unchanged.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let vector = SparseVector::from_pairs(vec![(5, 1.0), (2, 3.0), (5, 1.0), (7, 0.0)]);

        assert_eq!(vector.nnz(), 2);
        assert_eq!(vector.get(2), 3.0);
        assert_eq!(vector.get(5), 2.0);
        assert_eq!(vector.get(7), 0.0);
        assert_eq!(vector.iter().collect::<Vec<_>>(), vec![(2, 3.0), (5, 2.0)]);
    }

    #[test]
    fn test_l2_normalize() {
        let mut vector = SparseVector::from_pairs(vec![(0, 3.0), (1, 4.0)]);
        vector.l2_normalize();

        assert!((vector.get(0) - 0.6).abs() < 1e-12);
        assert!((vector.get(1) - 0.8).abs() < 1e-12);
        assert!((vector.norm() - 1.0).abs() < 1e-12);

        let mut empty = SparseVector::new();
        empty.l2_normalize();
        assert!(empty.is_empty());
    }
}
