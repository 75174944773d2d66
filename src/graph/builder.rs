//! Graph construction from feature rows

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::preprocessing::{feature_matrix, select_feature_columns, Preprocessed};
use crate::data::table::{FeatureMatrix, NodeRecord, RawTable};
use crate::error::{GraphError, Result};
use crate::graph::distance::{DistanceMatrix, Metric};
use crate::graph::CompressedGraph;

/// How rows are connected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMethod {
    /// Each row links to its `k` nearest other rows (Euclidean).
    Knn { k: usize },
    /// Link every pair with Euclidean distance <= threshold.
    DistanceThreshold { threshold: f64 },
    /// Link every pair with cosine similarity >= threshold.
    SimilarityThreshold { threshold: f64 },
}

impl GraphMethod {
    /// Resolve a method name, taking the parameter that method uses.
    pub fn from_name(name: &str, k: usize, distance_threshold: f64, similarity_threshold: f64) -> Result<Self> {
        let method = match name {
            "knn" => GraphMethod::Knn { k },
            "distance_threshold" => GraphMethod::DistanceThreshold {
                threshold: distance_threshold,
            },
            "similarity_threshold" => GraphMethod::SimilarityThreshold {
                threshold: similarity_threshold,
            },
            other => return Err(GraphError::InvalidMethod(other.to_string())),
        };
        method.validate()?;
        Ok(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            GraphMethod::Knn { .. } => "knn",
            GraphMethod::DistanceThreshold { .. } => "distance_threshold",
            GraphMethod::SimilarityThreshold { .. } => "similarity_threshold",
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            GraphMethod::SimilarityThreshold { .. } => Metric::Cosine,
            _ => Metric::Euclidean,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            GraphMethod::DistanceThreshold { threshold } | GraphMethod::SimilarityThreshold { threshold }
                if !threshold.is_finite() =>
            {
                Err(GraphError::InvalidParameter {
                    name: "threshold",
                    message: format!("{} is not finite", threshold),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Builds a `CompressedGraph` over the rows of a table.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    method: GraphMethod,
    directed: bool,
    targets: Vec<String>,
}

impl GraphBuilder {
    pub fn new(method: GraphMethod) -> Self {
        Self {
            method,
            directed: false,
            targets: Vec::new(),
        }
    }

    /// Store edges as ordered pairs.
    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Declare label columns; they are kept apart on node records and
    /// excluded from default feature selection.
    pub fn targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Build a graph with one node per raw row.
    ///
    /// Distances come from `preprocessed` when given, otherwise from the
    /// raw numeric non-target columns. When the preprocessed row count
    /// differs from the raw one, raw rows with missing cells are taken to
    /// have been filtered out: preprocessed row `r` maps to the `r`-th
    /// complete raw row and the dropped rows stay as isolated nodes.
    pub fn build(&self, raw: &RawTable, preprocessed: Option<&FeatureMatrix>) -> Result<CompressedGraph> {
        log::info!("Building graph over {} rows with method {:?}", raw.n_rows(), self.method);

        let derived;
        let features = match preprocessed {
            Some(features) => features,
            None => {
                let columns = select_feature_columns(raw, None, &self.targets, &[])?;
                derived = feature_matrix(raw, &columns)?;
                &derived
            }
        };

        let row_to_node: Vec<usize> = if features.n_rows() == raw.n_rows() {
            (0..raw.n_rows()).collect()
        } else {
            let kept = raw.complete_rows();
            if kept.len() != features.n_rows() {
                return Err(GraphError::InputShapeMismatch(format!(
                    "preprocessed matrix has {} rows; raw table has {} rows, {} without missing values",
                    features.n_rows(),
                    raw.n_rows(),
                    kept.len()
                )));
            }
            log::warn!(
                "Row count mismatch ({} raw vs {} preprocessed): dropped rows with missing values",
                raw.n_rows(),
                features.n_rows()
            );
            kept
        };

        self.build_rows(raw, features, row_to_node)
    }

    /// Build from the output of `preprocess`, using its recorded row mapping.
    pub fn build_preprocessed(&self, raw: &RawTable, preprocessed: &Preprocessed) -> Result<CompressedGraph> {
        log::info!("Building graph over {} rows with method {:?}", raw.n_rows(), self.method);

        let kept = &preprocessed.kept_rows;
        if kept.len() != preprocessed.matrix.n_rows() || kept.iter().any(|&row| row >= raw.n_rows()) {
            return Err(GraphError::InputShapeMismatch(format!(
                "{} kept rows for a {} row matrix over a {} row table",
                kept.len(),
                preprocessed.matrix.n_rows(),
                raw.n_rows()
            )));
        }

        self.build_rows(raw, &preprocessed.matrix, kept.clone())
    }

    /// Build directly from node records and a matrix with one row per node.
    pub fn build_from_features(&self, nodes: Vec<NodeRecord>, features: &FeatureMatrix) -> Result<CompressedGraph> {
        if nodes.len() != features.n_rows() {
            return Err(GraphError::InputShapeMismatch(format!(
                "{} nodes but {} feature rows",
                nodes.len(),
                features.n_rows()
            )));
        }
        let row_to_node: Vec<usize> = (0..nodes.len()).collect();
        self.connect(nodes, features, &row_to_node)
    }

    /// Node records for every raw row, marking which ones carry usable features.
    fn build_rows(&self, raw: &RawTable, features: &FeatureMatrix, row_to_node: Vec<usize>) -> Result<CompressedGraph> {
        let mut embedded = vec![false; raw.n_rows()];
        for (row, &node) in row_to_node.iter().enumerate() {
            embedded[node] = !features.row(row).iter().any(|v| v.is_nan());
        }

        let nodes: Vec<NodeRecord> = (0..raw.n_rows())
            .map(|row| raw.node_record(row, &self.targets, embedded[row]))
            .collect();

        self.connect(nodes, features, &row_to_node)
    }

    fn connect(&self, nodes: Vec<NodeRecord>, features: &FeatureMatrix, row_to_node: &[usize]) -> Result<CompressedGraph> {
        let distances = DistanceMatrix::compute(features.view(), self.method.metric());

        let edges = select_edges(self.method, &distances, self.directed)
            .into_iter()
            .map(|(i, j, w)| (row_to_node[i], row_to_node[j], w));

        let graph = CompressedGraph::from_edges(nodes, self.directed, edges)?;
        log::info!(
            "Built {} graph with {} nodes and {} edges",
            if graph.directed { "directed" } else { "undirected" },
            graph.node_count,
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Pick edges in distance-matrix row space.
///
/// Threshold methods emit each qualifying pair once as `(i, j)` with `i < j`,
/// plus `(j, i)` when directed. Knn emits `(i, j)` for each chosen neighbour.
pub fn select_edges(method: GraphMethod, distances: &DistanceMatrix, directed: bool) -> Vec<(usize, usize, f64)> {
    let n = distances.len();
    let mut edges = Vec::new();

    match method {
        GraphMethod::Knn { k } => {
            for i in 0..n {
                for j in nearest_neighbors(distances, i, k) {
                    edges.push((i, j, distances.get(i, j)));
                }
            }
        }
        GraphMethod::DistanceThreshold { threshold } => {
            for (i, j) in (0..n).tuple_combinations() {
                let d = distances.get(i, j);
                if d <= threshold {
                    push_pair(&mut edges, i, j, d, directed);
                }
            }
        }
        GraphMethod::SimilarityThreshold { threshold } => {
            for (i, j) in (0..n).tuple_combinations() {
                let s = distances.get(i, j);
                if s >= threshold {
                    push_pair(&mut edges, i, j, s, directed);
                }
            }
        }
    }

    edges
}

fn push_pair(edges: &mut Vec<(usize, usize, f64)>, i: usize, j: usize, weight: f64, directed: bool) {
    edges.push((i, j, weight));
    if directed {
        edges.push((j, i, weight));
    }
}

/// The `k` rows closest to `i`, excluding `i`.
///
/// Ascending by distance, ties broken by row index. NaN distances never
/// qualify, so a row without usable features gets no neighbours.
pub fn nearest_neighbors(distances: &DistanceMatrix, i: usize, k: usize) -> Vec<usize> {
    let row = distances.row(i);
    let mut candidates: Vec<usize> = (0..distances.len())
        .filter(|&j| j != i && !row[j].is_nan())
        .collect();

    candidates.sort_by(|&a, &b| row[a].total_cmp(&row[b]).then(a.cmp(&b)));
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessing::{preprocess, ScalingMethod};
    use crate::data::table::AttrValue;
    use crate::test_support::bare_nodes;

    fn two_clusters() -> FeatureMatrix {
        FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![11.0, 10.0],
            vec![10.0, 11.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let err = GraphMethod::from_name("similarity", 5, 0.75, 0.95).unwrap_err();
        match err {
            GraphError::InvalidMethod(name) => assert_eq!(name, "similarity"),
            other => panic!("unexpected error: {other}"),
        }

        let err = GraphMethod::from_name("distance_threshold", 5, f64::NAN, 0.95).unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter { .. }));
    }

    #[test]
    fn test_distance_threshold_edges_match_distances() {
        let features = two_clusters();
        let threshold = 1.5;
        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold })
            .build_from_features(bare_nodes(6), &features)
            .unwrap();

        assert_eq!(graph.edge_count(), 6);

        let distances = DistanceMatrix::compute(features.view(), Metric::Euclidean);
        for i in 0..6 {
            for j in 0..6 {
                if i == j {
                    continue;
                }
                let d = distances.get(i, j);
                assert_eq!(graph.has_edge(i, j as u32), d <= threshold, "pair ({i}, {j}) at distance {d}");
            }
        }
    }

    #[test]
    fn test_distance_threshold_boundary_is_inclusive() {
        let features = FeatureMatrix::from_rows(&[vec![0.0], vec![2.0]]).unwrap();
        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold: 2.0 })
            .build_from_features(bare_nodes(2), &features)
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_similarity_threshold() {
        let features = FeatureMatrix::from_rows(&[vec![1.0, 0.0], vec![2.0, 0.1], vec![0.0, 1.0]]).unwrap();
        let graph = GraphBuilder::new(GraphMethod::SimilarityThreshold { threshold: 0.95 })
            .build_from_features(bare_nodes(3), &features)
            .unwrap();

        assert_eq!(graph.edge_list().len(), 1);
        assert!(graph.has_edge(0, 1));
        assert!(graph.edge_weight(0, 1).unwrap() >= 0.95);
    }

    #[test]
    fn test_knn_union_and_degree_bounds() {
        let features = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![3.0], vec![10.0]]).unwrap();
        let k = 1;
        let graph = GraphBuilder::new(GraphMethod::Knn { k })
            .build_from_features(bare_nodes(4), &features)
            .unwrap();

        // 0-1, 1-0, 2-1, 3-2: union gives {0-1, 1-2, 2-3}
        assert_eq!(graph.edge_count(), 3);
        for node in 0..4 {
            assert!(graph.degree(node) >= k);
            assert!(graph.degree(node) <= 3);
        }
        assert_eq!(graph.degree(1), 2);
    }

    #[test]
    fn test_knn_ties_break_by_index() {
        let features = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![-1.0]]).unwrap();
        let distances = DistanceMatrix::compute(features.view(), Metric::Euclidean);
        assert_eq!(nearest_neighbors(&distances, 0, 1), vec![1]);
        assert_eq!(nearest_neighbors(&distances, 0, 5), vec![1, 2]);
        assert!(nearest_neighbors(&distances, 0, 0).is_empty());
    }

    #[test]
    fn test_knn_directed_keeps_ordered_choices() {
        let features = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![3.0]]).unwrap();
        let graph = GraphBuilder::new(GraphMethod::Knn { k: 1 })
            .directed(true)
            .build_from_features(bare_nodes(3), &features)
            .unwrap();

        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert!(graph.has_edge(2, 1));
        assert!(!graph.has_edge(1, 2));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_build_reconciles_dropped_rows() {
        let raw = RawTable::new(
            vec!["x".into(), "label".into()],
            vec![
                vec![AttrValue::Float(0.0), AttrValue::from("A")],
                vec![AttrValue::Null, AttrValue::from("A")],
                vec![AttrValue::Float(0.5), AttrValue::from("B")],
            ],
        )
        .unwrap();
        let pre = FeatureMatrix::from_rows(&[vec![0.0], vec![0.5]]).unwrap();

        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold: 1.0 })
            .targets(vec!["label".into()])
            .build(&raw, Some(&pre))
            .unwrap();

        assert_eq!(graph.node_count, 3);
        assert!(graph.has_edge(0, 2));
        assert_eq!(graph.degree(1), 0);
        assert!(!graph.node(1).embedded);
        assert_eq!(graph.node(2).label("label"), Some(&AttrValue::from("B")));

        let bad = FeatureMatrix::from_rows(&[vec![0.0]]).unwrap();
        let err = GraphBuilder::new(GraphMethod::Knn { k: 1 }).build(&raw, Some(&bad)).unwrap_err();
        assert!(matches!(err, GraphError::InputShapeMismatch(_)));
    }

    #[test]
    fn test_build_without_preprocessed_uses_numeric_columns() {
        let raw = RawTable::new(
            vec!["x".into(), "class".into()],
            vec![
                vec![AttrValue::Float(0.0), AttrValue::Int(100)],
                vec![AttrValue::Float(0.1), AttrValue::Int(-100)],
            ],
        )
        .unwrap();

        // `class` is a target, so it must not pull the rows apart.
        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold: 0.5 })
            .targets(vec!["class".into()])
            .build(&raw, None)
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_similarity_threshold_boundary_is_inclusive() {
        // Similarities are exactly 1.0 for rows 0-1 and exactly 0.0 against row 2
        let features = FeatureMatrix::from_rows(&[vec![1.0, 0.0], vec![2.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let at_one = GraphBuilder::new(GraphMethod::SimilarityThreshold { threshold: 1.0 })
            .build_from_features(bare_nodes(3), &features)
            .unwrap();
        assert_eq!(at_one.edge_list(), vec![(0, 1, 1.0)]);

        let at_zero = GraphBuilder::new(GraphMethod::SimilarityThreshold { threshold: 0.0 })
            .build_from_features(bare_nodes(3), &features)
            .unwrap();
        assert_eq!(at_zero.edge_count(), 3);
    }

    #[test]
    fn test_knn_with_large_k_connects_every_pair() {
        let features = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![5.0], vec![9.0]]).unwrap();
        for k in [3, 4, 100] {
            let graph = GraphBuilder::new(GraphMethod::Knn { k })
                .build_from_features(bare_nodes(4), &features)
                .unwrap();
            assert_eq!(graph.edge_count(), 6, "k = {k}");
            assert!((0..4).all(|node| graph.degree(node) == 3));
        }
    }

    #[test]
    fn test_directed_threshold_stores_both_directions() {
        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold: 1.5 })
            .directed(true)
            .build_from_features(bare_nodes(6), &two_clusters())
            .unwrap();

        assert_eq!(graph.edge_count(), 12);
        for (src, dst, _) in graph.edge_list() {
            assert!(graph.has_edge(dst, src as u32), "missing reverse of ({src}, {dst})");
        }
        assert!(!graph.has_edge(0, 3));
    }

    #[test]
    fn test_knn_degree_bounds_on_scattered_points() {
        let features = FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![3.0, 1.0],
            vec![1.0, 4.0],
            vec![5.0, 5.0],
            vec![2.0, 2.0],
            vec![7.0, 1.0],
            vec![6.0, 3.0],
            vec![4.0, 7.0],
        ])
        .unwrap();
        let distances = DistanceMatrix::compute(features.view(), Metric::Euclidean);

        for k in 1..=6 {
            let graph = GraphBuilder::new(GraphMethod::Knn { k })
                .build_from_features(bare_nodes(8), &features)
                .unwrap();
            for node in 0..8 {
                assert!(graph.degree(node) >= k, "node {node} below k = {k}");
                assert!(graph.degree(node) <= 7);
                for nb in nearest_neighbors(&distances, node, k) {
                    assert!(graph.has_edge(node, nb as u32));
                }
            }
        }
    }

    #[test]
    fn test_knn_skips_rows_without_features() {
        let raw = RawTable::new(
            vec!["x".into()],
            vec![
                vec![AttrValue::Float(0.0)],
                vec![AttrValue::Float(100.0)],
                vec![AttrValue::Float(200.0)],
                vec![AttrValue::Null],
            ],
        )
        .unwrap();

        let graph = GraphBuilder::new(GraphMethod::Knn { k: 1 }).build(&raw, None).unwrap();

        assert_eq!(graph.edge_list(), vec![(0, 1, 100.0), (1, 2, 100.0)]);
        assert_eq!(graph.degree(3), 0);
        assert!(!graph.node(3).embedded);
        assert!(graph.node(0).embedded);
    }

    #[test]
    fn test_build_preprocessed_uses_kept_rows() {
        let raw = RawTable::new(
            vec!["x".into(), "label".into()],
            vec![
                vec![AttrValue::Float(0.0), AttrValue::from("A")],
                vec![AttrValue::Float(f64::NAN), AttrValue::from("A")],
                vec![AttrValue::Float(0.5), AttrValue::from("B")],
            ],
        )
        .unwrap();
        let targets = vec!["label".to_string()];
        let pre = preprocess(&raw, None, &targets, &[], ScalingMethod::None).unwrap();

        let graph = GraphBuilder::new(GraphMethod::DistanceThreshold { threshold: 1.0 })
            .targets(targets)
            .build_preprocessed(&raw, &pre)
            .unwrap();

        assert_eq!(graph.edge_list(), vec![(0, 2, 0.5)]);
        assert!(!graph.node(1).embedded);

        let mut shifted = pre.clone();
        shifted.kept_rows = vec![0, 5];
        let err = GraphBuilder::new(GraphMethod::Knn { k: 1 })
            .build_preprocessed(&raw, &shifted)
            .unwrap_err();
        assert!(matches!(err, GraphError::InputShapeMismatch(_)));
    }
}
