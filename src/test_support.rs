//! Shared fixtures for unit tests

use std::collections::BTreeMap;

use crate::data::table::{AttrValue, NodeRecord};
use crate::graph::CompressedGraph;

pub(crate) fn bare_nodes(n: usize) -> Vec<NodeRecord> {
    (0..n)
        .map(|index| NodeRecord {
            index,
            embedded: true,
            targets: BTreeMap::new(),
            extra: BTreeMap::new(),
        })
        .collect()
}

/// Nodes carrying a text label under `attribute`; `None` stores a null cell.
pub(crate) fn labeled_nodes(attribute: &str, labels: &[Option<&str>]) -> Vec<NodeRecord> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let mut targets = BTreeMap::new();
            let value = label.map_or(AttrValue::Null, AttrValue::from);
            targets.insert(attribute.to_string(), value);
            NodeRecord {
                index,
                embedded: true,
                targets,
                extra: BTreeMap::new(),
            }
        })
        .collect()
}

/// Undirected labelled graph from unweighted edges.
pub(crate) fn labeled_graph(attribute: &str, labels: &[Option<&str>], edges: &[(usize, usize)]) -> CompressedGraph {
    CompressedGraph::from_edges(
        labeled_nodes(attribute, labels),
        false,
        edges.iter().map(|&(u, v)| (u, v, 1.0)),
    )
    .unwrap()
}

pub(crate) fn unlabeled_graph(n: usize, directed: bool, edges: &[(usize, usize)]) -> CompressedGraph {
    CompressedGraph::from_edges(bare_nodes(n), directed, edges.iter().map(|&(u, v)| (u, v, 1.0))).unwrap()
}
