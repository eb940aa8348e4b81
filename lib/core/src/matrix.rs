//! Square pairwise similarity matrices
//!
//! Every matrix is dense and quadratic in the record count. That is fine at
//! dataset scale; a larger corpus would need an index-based neighbor search.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::vector::Vector;

/// Dense n×n similarity matrix over record indices
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build a matrix by evaluating `f(i, j)` for every pair
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut matrix = Self::zeros(n);
        for i in 0..n {
            for j in 0..n {
                matrix.data[i * n + j] = f(i, j);
            }
        }
        matrix
    }

    /// Pairwise cosine similarity between rows
    pub fn cosine(rows: &[Vector]) -> Self {
        let n = rows.len();
        let mut matrix = Self::zeros(n);
        for i in 0..n {
            for j in i..n {
                let sim = rows[i].cosine_similarity(&rows[j]);
                matrix.data[i * n + j] = sim;
                matrix.data[j * n + i] = sim;
            }
        }
        matrix
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// `self += weight * other`
    pub fn add_scaled(&mut self, other: &SimilarityMatrix, weight: f64) {
        assert_eq!(self.n, other.n);
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += weight * b;
        }
    }

    pub fn zero_diagonal(&mut self) {
        for i in 0..self.n {
            self.data[i * self.n + i] = 0.0;
        }
    }

    /// Highest-scoring neighbors of row `i`, never `i` itself.
    ///
    /// Scores descend; equal scores keep ascending index order.
    pub fn top_k(&self, i: usize, k: usize) -> Vec<(usize, f64)> {
        let row = self.row(i);
        let mut candidates: Vec<usize> = (0..self.n).filter(|&j| j != i).collect();
        candidates.sort_by_key(|&j| Reverse(OrderedFloat(row[j])));
        candidates.truncate(k);
        candidates.into_iter().map(|j| (j, row[j])).collect()
    }
}
