//! Dense pairwise distance / similarity matrices
//!
//! Time is O(N²·D) and memory O(N²); the dense matrix is the scaling limit
//! of graph construction.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Pairwise metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Euclidean distance; diagonal is 0.
    Euclidean,
    /// Cosine similarity; diagonal is 1.
    Cosine,
}

/// N×N matrix of pairwise values between feature rows.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Compute the matrix for every pair of rows.
    ///
    /// Rows are computed in parallel; each entry depends only on its two
    /// rows so the result does not depend on the thread count.
    pub fn compute(features: ArrayView2<'_, f64>, metric: Metric) -> Self {
        let n = features.nrows();
        log::debug!("Computing {:?} matrix for {} rows x {} features", metric, n, features.ncols());

        let norms: Vec<f64> = match metric {
            Metric::Cosine => features.outer_iter().map(|r| r.dot(&r).sqrt()).collect(),
            Metric::Euclidean => Vec::new(),
        };

        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let a = features.row(i);
                (0..n)
                    .map(|j| match metric {
                        Metric::Euclidean => {
                            if i == j {
                                0.0
                            } else {
                                euclidean(a, features.row(j))
                            }
                        }
                        Metric::Cosine => {
                            if i == j {
                                1.0
                            } else {
                                cosine(a, features.row(j), norms[i], norms[j])
                            }
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = Array2::<f64>::zeros((n, n));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, v) in row.into_iter().enumerate() {
                values[[i, j]] = v;
            }
        }

        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Zero-norm rows are orthogonal to everything.
fn cosine(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}
