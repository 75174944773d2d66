//! Per-node neighbourhood label breakdown

use serde::{Deserialize, Serialize};

use crate::data::table::AttrValue;
use crate::error::{GraphError, Result};
use crate::graph::CompressedGraph;

/// Sorted distinct values of one attribute over all nodes of a graph.
///
/// Computed once and passed to every consumer so they agree on columns.
/// Nodes without a value share the `Null` column, which sorts first and is
/// present only when some node lacks a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelUniverse {
    attribute: String,
    values: Vec<AttrValue>,
}

impl LabelUniverse {
    /// Scan every node for `attribute`.
    ///
    /// Fails with `UnknownAttribute` when the graph has nodes but none of
    /// them carries the attribute at all.
    pub fn from_graph(graph: &CompressedGraph, attribute: &str) -> Result<Self> {
        if graph.node_count > 0 && !graph.nodes.iter().any(|n| n.has_attribute(attribute)) {
            return Err(GraphError::UnknownAttribute(attribute.to_string()));
        }

        let mut values: Vec<AttrValue> = graph
            .nodes
            .iter()
            .map(|n| n.label(attribute).cloned().unwrap_or(AttrValue::Null))
            .collect();
        values.sort();
        values.dedup();

        Ok(Self {
            attribute: attribute.to_string(),
            values,
        })
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn values(&self) -> &[AttrValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column position of a value.
    pub fn position(&self, value: &AttrValue) -> Option<usize> {
        self.values.binary_search(value).ok()
    }

    /// Column of a node's own value; a missing value maps to the `Null` column.
    pub fn column_of(&self, value: Option<&AttrValue>) -> Option<usize> {
        self.position(value.unwrap_or(&AttrValue::Null))
    }
}

/// Whether a table reports raw counts or count / degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    #[default]
    Counts,
    Probabilities,
}

impl ProfileMode {
    fn prefix(&self) -> &'static str {
        match self {
            ProfileMode::Counts => "n",
            ProfileMode::Probabilities => "p",
        }
    }
}

/// Neighbour label counts of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborProfile {
    pub node: usize,

    /// The node's own value, `None` when missing.
    pub value: Option<AttrValue>,

    /// Number of neighbours.
    pub degree: usize,

    /// Neighbour count per universe value, in universe order.
    pub counts: Vec<usize>,
}

impl NeighborProfile {
    /// count / degree per universe value; all zeros for isolated nodes.
    pub fn probabilities(&self) -> Vec<f64> {
        if self.degree == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| c as f64 / self.degree as f64)
            .collect()
    }
}

/// One profile per node, in node order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodTable {
    pub universe: LabelUniverse,
    pub mode: ProfileMode,
    pub rows: Vec<NeighborProfile>,
}

impl NeighborhoodTable {
    pub fn attribute(&self) -> &str {
        self.universe.attribute()
    }

    /// Header: node index, node value, degree, then one column per value.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![
            "node_index".to_string(),
            format!("node_{}", self.attribute()),
            "degree".to_string(),
        ];
        names.extend(
            self.universe
                .values()
                .iter()
                .map(|v| format!("{}_{}", self.mode.prefix(), v)),
        );
        names
    }

    /// Per-value columns of a row in the table's mode.
    pub fn row_values(&self, row: &NeighborProfile) -> Vec<f64> {
        match self.mode {
            ProfileMode::Counts => row.counts.iter().map(|&c| c as f64).collect(),
            ProfileMode::Probabilities => row.probabilities(),
        }
    }
}

/// Count each universe value among the direct neighbours of every node.
///
/// Neighbours are successors in directed graphs. Neighbours without a
/// value count in the `Null` column, so counts always sum to the degree.
pub fn profile_neighborhoods(graph: &CompressedGraph, universe: &LabelUniverse, mode: ProfileMode) -> NeighborhoodTable {
    let attribute = universe.attribute();
    log::info!(
        "Profiling neighbourhoods of {} nodes over {} values of '{}'",
        graph.node_count,
        universe.len(),
        attribute
    );

    // Column position of every node's own value, resolved once.
    let positions: Vec<Option<usize>> = graph
        .nodes
        .iter()
        .map(|n| universe.column_of(n.label(attribute)))
        .collect();

    let rows = (0..graph.node_count)
        .map(|node| {
            let mut counts = vec![0usize; universe.len()];
            let neighbors = graph.outgoing_edges(node);
            for &nb in neighbors {
                if let Some(pos) = positions[nb as usize] {
                    counts[pos] += 1;
                }
            }

            NeighborProfile {
                node,
                value: graph.node(node).label(attribute).cloned(),
                degree: neighbors.len(),
                counts,
            }
        })
        .collect();

    NeighborhoodTable {
        universe: universe.clone(),
        mode,
        rows,
    }
}
