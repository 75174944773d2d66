//! Community detection strategies

use std::collections::BTreeMap;

use petgraph::algo::connected_components;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::cluster::{CommunityDetector, Partition};
use crate::error::Result;
use crate::graph::algorithms::{brandes, to_petgraph};
use crate::graph::CompressedGraph;

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set (for union by size)
    size: Vec<usize>,
}

impl DisjointSets {
    pub fn new(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
            size: vec![1; count],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let px = self.parent[x];
        if px != x {
            self.parent[x] = self.find(px);
        }
        self.parent[x]
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        if self.size[root_x] > self.size[root_y] {
            self.parent[root_y] = root_x;
            self.size[root_x] += self.size[root_y];
        } else {
            self.parent[root_x] = root_y;
            self.size[root_y] += self.size[root_x];
        }
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

/// Group nodes into connected components.
///
/// Components are ordered largest first, ties by smallest member.
pub fn components_from_edges(node_count: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Vec<Vec<usize>> {
    let mut sets = DisjointSets::new(node_count);
    for (src, dst) in edges {
        sets.union(src, dst);
    }

    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in 0..node_count {
        let root = sets.find(node);
        by_root.entry(root).or_default().push(node);
    }

    let mut components: Vec<Vec<usize>> = by_root.into_values().collect();
    components.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
    components
}

/// Each connected component is a community.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedComponents;

impl CommunityDetector for ConnectedComponents {
    fn name(&self) -> &'static str {
        "connected_components"
    }

    fn detect(&self, graph: &CompressedGraph) -> Result<Partition> {
        log::info!("Finding connected components of {} nodes", graph.node_count);
        let edges = graph.edge_list().into_iter().map(|(u, v, _)| (u, v));
        let components = components_from_edges(graph.node_count, edges);
        log::info!("Found {} components", components.len());
        Ok(Partition::from_communities(components))
    }
}

/// First divisive split of Girvan-Newman.
///
/// Repeatedly removes the edge with the highest edge betweenness (ties go
/// to the smallest endpoint pair) until the number of connected components
/// grows, then reports the components. A graph without edges yields its
/// components unchanged. Edge orientation is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GirvanNewman;

impl CommunityDetector for GirvanNewman {
    fn name(&self) -> &'static str {
        "girvan_newman"
    }

    fn detect(&self, graph: &CompressedGraph) -> Result<Partition> {
        log::info!(
            "Running Girvan-Newman on {} nodes and {} edges",
            graph.node_count,
            graph.edge_count()
        );

        let mut pg = to_petgraph(graph);
        let initial = connected_components(&pg);
        let mut removed = 0usize;

        while pg.edge_count() > 0 && connected_components(&pg) <= initial {
            let scores = brandes(pg.node_count(), false, |v| {
                pg.neighbors(NodeIndex::new(v)).map(|n| n.index()).collect::<Vec<_>>()
            })
            .edges;

            let mut best: Option<((usize, usize), f64)> = None;
            for (&edge, &score) in &scores {
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((edge, score));
                }
            }

            let Some(((a, b), score)) = best else {
                break;
            };
            if let Some(edge) = pg.find_edge(NodeIndex::new(a), NodeIndex::new(b)) {
                log::debug!("Removing edge ({}, {}) with betweenness {:.3}", a, b, score);
                pg.remove_edge(edge);
                removed += 1;
            }
        }

        let edges = pg.edge_references().map(|e| (e.source().index(), e.target().index()));
        let components = components_from_edges(pg.node_count(), edges);
        log::info!(
            "Girvan-Newman removed {} edges, found {} communities",
            removed,
            components.len()
        );
        Ok(Partition::from_communities(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unlabeled_graph;

    #[test]
    fn test_disjoint_sets() {
        let mut sets = DisjointSets::new(5);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);
        assert_eq!(sets.size(0), 4);
        assert_eq!(sets.size(2), 1);
        assert_eq!(sets.find(0), sets.find(3));
    }

    #[test]
    fn test_connected_components_cover_graph() {
        let g = unlabeled_graph(6, false, &[(0, 1), (1, 2), (4, 5)]);
        let p = ConnectedComponents.detect(&g).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.members(0), Some(&[0, 1, 2][..]));
        assert_eq!(p.members(1), Some(&[4, 5][..]));
        assert_eq!(p.members(2), Some(&[3][..]));
        assert!(p.validate(6).is_ok());
    }

    #[test]
    fn test_girvan_newman_splits_bridge() {
        // Two triangles joined by the bridge 2-3
        let g = unlabeled_graph(6, false, &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)]);
        let p = GirvanNewman.detect(&g).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.members(0), Some(&[0, 1, 2][..]));
        assert_eq!(p.members(1), Some(&[3, 4, 5][..]));
    }

    #[test]
    fn test_girvan_newman_without_edges() {
        let g = unlabeled_graph(3, false, &[]);
        let p = GirvanNewman.detect(&g).unwrap();
        assert_eq!(p.len(), 3);
        assert!(p.validate(3).is_ok());
    }
}
