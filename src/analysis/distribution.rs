//! Degree and betweenness value sequences for histogramming

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::graph::algorithms::betweenness_centrality;
use crate::graph::CompressedGraph;

/// Summary statistics of a value sequence. All zero for an empty sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                std_dev: 0.0,
                median: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        // Sample standard deviation is undefined for a single value
        let std_dev = if values.len() > 1 { values.iter().std_dev() } else { 0.0 };

        Self {
            count: values.len(),
            mean: values.iter().mean(),
            std_dev,
            median: Data::new(values.to_vec()).median(),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        }
    }
}

/// Per-node degree (in + out for directed graphs), in node-index order.
pub fn degree_sequence(graph: &CompressedGraph) -> Vec<usize> {
    (0..graph.node_count).map(|node| graph.degree(node)).collect()
}

/// Per-node betweenness centrality, in node-index order.
pub fn betweenness_sequence(graph: &CompressedGraph) -> Vec<f64> {
    betweenness_centrality(graph)
}

/// Raw sequences plus summaries, handed to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDistributions {
    pub degree: Vec<usize>,
    pub betweenness: Vec<f64>,
    pub degree_summary: DistributionSummary,
    pub betweenness_summary: DistributionSummary,
}

/// Compute both distributions of a graph.
pub fn graph_distributions(graph: &CompressedGraph) -> GraphDistributions {
    log::info!("Computing degree and betweenness distributions");

    let degree = degree_sequence(graph);
    let betweenness = betweenness_sequence(graph);
    let degree_values: Vec<f64> = degree.iter().map(|&d| d as f64).collect();

    GraphDistributions {
        degree_summary: DistributionSummary::from_values(&degree_values),
        betweenness_summary: DistributionSummary::from_values(&betweenness),
        degree,
        betweenness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unlabeled_graph;

    #[test]
    fn test_degree_sequence_matches_edge_set() {
        let edges = [(0, 1), (0, 2), (1, 2), (3, 4)];
        let g = unlabeled_graph(6, false, &edges);

        let mut expected = vec![0usize; 6];
        for (u, v, _) in g.edge_list() {
            expected[u] += 1;
            expected[v] += 1;
        }
        assert_eq!(degree_sequence(&g), expected);
        assert_eq!(degree_sequence(&g), vec![2, 2, 2, 1, 1, 0]);
    }

    #[test]
    fn test_betweenness_is_not_degree() {
        // Path 0-1-2-3: degrees [1, 2, 2, 1], betweenness [0, 2, 2, 0]
        let g = unlabeled_graph(4, false, &[(0, 1), (1, 2), (2, 3)]);
        let d = graph_distributions(&g);
        assert_eq!(d.degree, vec![1, 2, 2, 1]);
        assert_eq!(d.betweenness, vec![0.0, 2.0, 2.0, 0.0]);
        assert_eq!(d.degree_summary.mean, 1.5);
        assert_eq!(d.degree_summary.median, 1.5);
        assert_eq!(d.betweenness_summary.max, 2.0);
    }

    #[test]
    fn test_empty_graph() {
        let g = unlabeled_graph(0, false, &[]);
        let d = graph_distributions(&g);
        assert!(d.degree.is_empty());
        assert_eq!(d.degree_summary.count, 0);
        assert_eq!(d.degree_summary.mean, 0.0);
    }
}
