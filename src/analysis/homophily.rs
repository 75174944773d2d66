//! Pooled label-conditional neighbour probabilities

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::analysis::neighborhood::NeighborhoodTable;
use crate::data::table::AttrValue;

/// P(neighbour label = j | node label = i) for every label pair.
///
/// Rows are node labels, columns neighbour labels, both in universe order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomophilyMatrix {
    pub attribute: String,
    pub labels: Vec<AttrValue>,
    pub probabilities: Array2<f64>,
}

impl HomophilyMatrix {
    /// P(j | i), or `None` when either label is unknown.
    pub fn get(&self, i: &AttrValue, j: &AttrValue) -> Option<f64> {
        let row = self.labels.iter().position(|l| l == i)?;
        let col = self.labels.iter().position(|l| l == j)?;
        Some(self.probabilities[[row, col]])
    }

    /// Every `(i, j, P(j | i))` in row-major order.
    pub fn pairs(&self) -> impl Iterator<Item = (&AttrValue, &AttrValue, f64)> + '_ {
        self.labels.iter().enumerate().flat_map(move |(r, i)| {
            self.labels
                .iter()
                .enumerate()
                .map(move |(c, j)| (i, j, self.probabilities[[r, c]]))
        })
    }

    /// Sum of P(j | i) over j.
    pub fn row_sum(&self, i: &AttrValue) -> Option<f64> {
        let row = self.labels.iter().position(|l| l == i)?;
        Some(self.probabilities.row(row).sum())
    }
}

/// Pool neighbour counts by the node's own label.
///
/// P(j | i) = Σ count_j / Σ degree over nodes labelled i. Pooling keeps
/// low-degree nodes from dominating; a zero denominator yields 0. Nodes
/// without a value pool into the `Null` row and column.
pub fn estimate_homophily(table: &NeighborhoodTable) -> HomophilyMatrix {
    let universe = &table.universe;
    let n = universe.len();

    let mut neighbor_sums = Array2::<f64>::zeros((n, n));
    let mut degree_sums = vec![0usize; n];

    for row in &table.rows {
        let Some(i) = universe.column_of(row.value.as_ref()) else {
            continue;
        };
        degree_sums[i] += row.degree;
        for (j, &count) in row.counts.iter().enumerate() {
            neighbor_sums[[i, j]] += count as f64;
        }
    }

    let mut probabilities = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        if degree_sums[i] == 0 {
            continue;
        }
        for j in 0..n {
            probabilities[[i, j]] = neighbor_sums[[i, j]] / degree_sums[i] as f64;
        }
    }

    log::debug!("Estimated {}x{} homophily matrix for '{}'", n, n, table.attribute());

    HomophilyMatrix {
        attribute: table.attribute().to_string(),
        labels: universe.values().to_vec(),
        probabilities,
    }
}
