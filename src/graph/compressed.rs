//! Compressed sparse row graph with attributed nodes and weighted edges

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::table::NodeRecord;
use crate::error::{GraphError, Result};

/// Compressed sparse representation of a row-similarity graph.
///
/// Undirected edges are stored in both endpoints' adjacency lists; directed
/// edges only in the source's list. Nodes are exactly `0..node_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Whether edges are ordered pairs
    pub directed: bool,

    /// offsets[i] to offsets[i+1] defines the adjacency range for node i
    pub offsets: Vec<u32>,

    /// Concatenated, sorted adjacency lists
    pub edges: Vec<u32>,

    /// Weight of each adjacency entry, parallel to `edges`
    pub weights: Vec<f64>,

    /// In-degree per node (directed graphs only, empty otherwise)
    pub in_degrees: Vec<u32>,

    /// Attributes of each node
    pub nodes: Vec<NodeRecord>,
}

impl CompressedGraph {
    /// Build from an edge list.
    ///
    /// Self-loops are dropped and parallel edges collapse to one (the first
    /// weight wins). For undirected graphs `(u, v)` and `(v, u)` are the same
    /// edge. Every endpoint must be a valid node index.
    pub fn from_edges(
        nodes: Vec<NodeRecord>,
        directed: bool,
        edge_list: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let node_count = nodes.len();
        let mut unique: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for (src, dst, weight) in edge_list {
            if src >= node_count || dst >= node_count {
                return Err(GraphError::InvalidParameter {
                    name: "edge",
                    message: format!("edge ({}, {}) outside node range 0..{}", src, dst, node_count),
                });
            }
            if src == dst {
                continue;
            }
            let key = if directed { (src, dst) } else { (src.min(dst), src.max(dst)) };
            unique.entry(key).or_insert(weight);
        }

        let mut adjacency: Vec<Vec<(u32, f64)>> = vec![Vec::new(); node_count];
        let mut in_degrees = if directed { vec![0u32; node_count] } else { Vec::new() };

        for (&(src, dst), &weight) in &unique {
            adjacency[src].push((dst as u32, weight));
            if directed {
                in_degrees[dst] += 1;
            } else {
                adjacency[dst].push((src as u32, weight));
            }
        }

        let total: usize = adjacency.iter().map(|list| list.len()).sum();
        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut edges = Vec::with_capacity(total);
        let mut weights = Vec::with_capacity(total);

        offsets.push(0);
        let mut offset = 0u32;
        for mut list in adjacency {
            // Sort for binary search efficiency
            list.sort_unstable_by_key(|&(dst, _)| dst);
            offset += list.len() as u32;
            offsets.push(offset);
            for (dst, weight) in list {
                edges.push(dst);
                weights.push(weight);
            }
        }

        Ok(Self {
            node_count,
            directed,
            offsets,
            edges,
            weights,
            in_degrees,
            nodes,
        })
    }

    /// Neighbours of a node (successors for directed graphs)
    pub fn outgoing_edges(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Weights parallel to `outgoing_edges(node)`
    pub fn outgoing_weights(&self, node: usize) -> &[f64] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.weights[start..end]
    }

    /// Check if there's an edge from src to dst
    pub fn has_edge(&self, src: usize, dst: u32) -> bool {
        self.outgoing_edges(src).binary_search(&dst).is_ok()
    }

    /// Weight of the edge from src to dst, if present
    pub fn edge_weight(&self, src: usize, dst: usize) -> Option<f64> {
        let pos = self.outgoing_edges(src).binary_search(&(dst as u32)).ok()?;
        Some(self.outgoing_weights(src)[pos])
    }

    pub fn out_degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Total degree: neighbour count for undirected graphs, in + out for directed.
    pub fn degree(&self, node: usize) -> usize {
        if self.directed {
            self.out_degree(node) + self.in_degrees[node] as usize
        } else {
            self.out_degree(node)
        }
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        if self.directed {
            self.edges.len()
        } else {
            self.edges.len() / 2
        }
    }

    /// Each edge exactly once; undirected edges come out as `(u, v)` with `u < v`.
    pub fn edge_list(&self) -> Vec<(usize, usize, f64)> {
        let mut list = Vec::with_capacity(self.edge_count());
        for src in 0..self.node_count {
            for (&dst, &weight) in self.outgoing_edges(src).iter().zip(self.outgoing_weights(src)) {
                let dst = dst as usize;
                if self.directed || src < dst {
                    list.push((src, dst, weight));
                }
            }
        }
        list
    }

    pub fn node(&self, index: usize) -> &NodeRecord {
        &self.nodes[index]
    }
}
