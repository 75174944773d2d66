//! Graph algorithms for analysis

use std::collections::{BTreeMap, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::graph::CompressedGraph;

/// Node and edge betweenness from one Brandes pass.
#[derive(Debug, Clone, Default)]
pub struct Betweenness {
    /// Per-node score, indexed by node.
    pub nodes: Vec<f64>,

    /// Per-edge score. Undirected keys are `(min, max)`.
    pub edges: BTreeMap<(usize, usize), f64>,
}

/// Brandes' algorithm over an unweighted adjacency.
///
/// Scores are unnormalised; for undirected graphs every unordered pair of
/// endpoints is counted once.
pub fn brandes<F, I>(node_count: usize, directed: bool, neighbors: F) -> Betweenness
where
    F: Fn(usize) -> I,
    I: IntoIterator<Item = usize>,
{
    let mut node_scores = vec![0.0_f64; node_count];
    let mut edge_scores: BTreeMap<(usize, usize), f64> = BTreeMap::new();

    let mut stack: Vec<usize> = Vec::with_capacity(node_count);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut sigma = vec![0.0_f64; node_count];
    let mut dist = vec![-1_i64; node_count];
    let mut delta = vec![0.0_f64; node_count];
    let mut queue = VecDeque::new();

    for s in 0..node_count {
        stack.clear();
        for v in 0..node_count {
            predecessors[v].clear();
            sigma[v] = 0.0;
            dist[v] = -1;
            delta[v] = 0.0;
        }

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        // Back-propagation of dependencies
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                let c = sigma[v] / sigma[w] * (1.0 + delta[w]);
                let key = if directed { (v, w) } else { (v.min(w), v.max(w)) };
                *edge_scores.entry(key).or_insert(0.0) += c;
                delta[v] += c;
            }
            if w != s {
                node_scores[w] += delta[w];
            }
        }
    }

    if !directed {
        node_scores.iter_mut().for_each(|b| *b /= 2.0);
        edge_scores.values_mut().for_each(|b| *b /= 2.0);
    }

    Betweenness {
        nodes: node_scores,
        edges: edge_scores,
    }
}

/// Betweenness centrality of every node, in node-index order.
pub fn betweenness_centrality(graph: &CompressedGraph) -> Vec<f64> {
    log::debug!("Computing betweenness centrality for {} nodes", graph.node_count);
    brandes(graph.node_count, graph.directed, |v| {
        graph.outgoing_edges(v).iter().map(|&w| w as usize)
    })
    .nodes
}

/// Betweenness of every edge.
pub fn edge_betweenness(graph: &CompressedGraph) -> BTreeMap<(usize, usize), f64> {
    brandes(graph.node_count, graph.directed, |v| {
        graph.outgoing_edges(v).iter().map(|&w| w as usize)
    })
    .edges
}

/// Undirected petgraph copy; node weights are node indices, edge weights
/// the construction metric. Directed edges lose their orientation.
pub fn to_petgraph(graph: &CompressedGraph) -> UnGraph<usize, f64> {
    let mut pg = UnGraph::<usize, f64>::with_capacity(graph.node_count, graph.edge_count());
    for node in 0..graph.node_count {
        pg.add_node(node);
    }
    for (src, dst, weight) in graph.edge_list() {
        let (a, b) = (NodeIndex::new(src), NodeIndex::new(dst));
        if pg.find_edge(a, b).is_none() {
            pg.add_edge(a, b, weight);
        }
    }
    pg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unlabeled_graph;

    #[test]
    fn test_path_betweenness() {
        let g = unlabeled_graph(3, false, &[(0, 1), (1, 2)]);
        assert_eq!(betweenness_centrality(&g), vec![0.0, 1.0, 0.0]);

        let edges = edge_betweenness(&g);
        assert_eq!(edges[&(0, 1)], 2.0);
        assert_eq!(edges[&(1, 2)], 2.0);
    }

    #[test]
    fn test_star_and_cycle_betweenness() {
        let star = unlabeled_graph(4, false, &[(0, 1), (0, 2), (0, 3)]);
        assert_eq!(betweenness_centrality(&star), vec![3.0, 0.0, 0.0, 0.0]);

        // Two shortest paths between opposite corners of a 4-cycle
        let cycle = unlabeled_graph(4, false, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        for score in betweenness_centrality(&cycle) {
            assert!((score - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_betweenness_differs_from_degree() {
        let g = unlabeled_graph(5, false, &[(0, 1), (1, 2), (2, 3), (3, 4), (0, 2)]);
        let degrees: Vec<f64> = (0..5).map(|n| g.degree(n) as f64).collect();
        assert_ne!(betweenness_centrality(&g), degrees);
    }

    #[test]
    fn test_directed_path() {
        let g = unlabeled_graph(3, true, &[(0, 1), (1, 2)]);
        assert_eq!(betweenness_centrality(&g), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_to_petgraph() {
        let g = unlabeled_graph(4, false, &[(0, 1), (2, 3)]);
        let pg = to_petgraph(&g);
        assert_eq!(pg.node_count(), 4);
        assert_eq!(pg.edge_count(), 2);
        assert_eq!(petgraph::algo::connected_components(&pg), 2);
    }
}
