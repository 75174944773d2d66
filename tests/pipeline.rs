use std::io::Write;

use tabular_graph::analysis::{analyze_label, graph_distributions};
use tabular_graph::cluster::detection::{ConnectedComponents, GirvanNewman};
use tabular_graph::cluster::metrics::{community_summaries, mixing_matrix};
use tabular_graph::data::table::{AttrValue, RawTable};
use tabular_graph::data::{loader, preprocessing};
use tabular_graph::storage::{self, AnalysisResults};
use tabular_graph::{CommunityDetector, GraphBuilder, GraphError, GraphMethod, Partition};

/// Two tight clusters of three points, far apart.
fn two_clusters() -> RawTable {
    let points = [
        (0.0, 0.0, "A"),
        (1.0, 0.0, "A"),
        (0.0, 1.0, "A"),
        (10.0, 10.0, "B"),
        (11.0, 10.0, "B"),
        (10.0, 11.0, "B"),
    ];
    let rows = points
        .iter()
        .map(|&(x, y, c)| vec![AttrValue::from(x), AttrValue::from(y), AttrValue::from(c)])
        .collect();
    RawTable::new(vec!["x".into(), "y".into(), "cluster".into()], rows).unwrap()
}

fn builder(method: GraphMethod) -> GraphBuilder {
    GraphBuilder::new(method).targets(vec!["cluster".to_string()])
}

#[test]
fn test_two_clusters_are_perfectly_homophilous() {
    let raw = two_clusters();
    let graph = builder(GraphMethod::DistanceThreshold { threshold: 1.5 })
        .build(&raw, None)
        .unwrap();

    assert_eq!(graph.node_count, 6);
    assert_eq!(graph.edge_count(), 6);
    for (u, v, _) in graph.edge_list() {
        assert_eq!(u < 3, v < 3, "edge ({u}, {v}) crosses clusters");
    }

    let partition = ConnectedComponents.detect(&graph).unwrap();
    let analysis = analyze_label(&graph, "cluster", &partition).unwrap();
    let h = &analysis.homophily;
    let (a, b) = (AttrValue::from("A"), AttrValue::from("B"));

    assert_eq!(h.get(&a, &a), Some(1.0));
    assert_eq!(h.get(&a, &b), Some(0.0));
    assert_eq!(h.get(&b, &b), Some(1.0));
    assert_eq!(h.get(&b, &a), Some(0.0));
}

#[test]
fn test_mixing_total_is_twice_edge_count() {
    let raw = two_clusters();
    let graph = builder(GraphMethod::Knn { k: 3 }).build(&raw, None).unwrap();

    let partition = GirvanNewman.detect(&graph).unwrap();
    let mixing = mixing_matrix(&graph, &partition).unwrap();
    assert_eq!(mixing.total(), 2 * graph.edge_count() as u64);
}

#[test]
fn test_partition_missing_a_node_is_rejected() {
    let raw = two_clusters();
    let graph = builder(GraphMethod::DistanceThreshold { threshold: 1.5 })
        .build(&raw, None)
        .unwrap();

    let partition = Partition::from_communities(vec![vec![0, 1, 2], vec![3, 4]]);
    match mixing_matrix(&graph, &partition) {
        Err(GraphError::PartitionMismatch { missing, .. }) => assert_eq!(missing, vec![5]),
        other => panic!("expected partition mismatch, got {other:?}"),
    }
}

#[test]
fn test_degree_sequence_matches_edges() {
    let raw = two_clusters();
    let graph = builder(GraphMethod::DistanceThreshold { threshold: 1.5 })
        .build(&raw, None)
        .unwrap();

    let distributions = graph_distributions(&graph);
    assert_eq!(distributions.degree, vec![2; 6]);
    assert_eq!(distributions.degree.iter().sum::<usize>(), 2 * graph.edge_count());
    // Every pair in a triangle is adjacent
    assert!(distributions.betweenness.iter().all(|&b| b == 0.0));
}

#[test]
fn test_csv_to_results_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("points.csv");
    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, "x,y,cluster").unwrap();
    writeln!(file, "0.0,0.0,A").unwrap();
    writeln!(file, "1.0,0.0,A").unwrap();
    writeln!(file, "0.0,1.0,A").unwrap();
    writeln!(file, "10.0,10.0,B").unwrap();
    writeln!(file, "11.0,10.0,B").unwrap();
    writeln!(file, "10.0,11.0,B").unwrap();
    drop(file);

    let targets = vec!["cluster".to_string()];
    let raw = loader::load_table(&input).unwrap();
    let pre = preprocessing::preprocess(&raw, None, &targets, &[], preprocessing::ScalingMethod::None).unwrap();
    assert_eq!(pre.feature_columns, vec!["x".to_string(), "y".to_string()]);

    let method = GraphMethod::DistanceThreshold { threshold: 1.5 };
    let graph = builder(method).build_preprocessed(&raw, &pre).unwrap();
    let distributions = graph_distributions(&graph);
    let partition = ConnectedComponents.detect(&graph).unwrap();
    let mixing = mixing_matrix(&graph, &partition).unwrap();
    let communities = community_summaries(&graph, &partition).unwrap();
    let labels = vec![analyze_label(&graph, "cluster", &partition).unwrap()];

    let out = dir.path().join("results");
    let results = AnalysisResults {
        graph: &graph,
        method,
        distributions: &distributions,
        detector: ConnectedComponents.name(),
        partition: &partition,
        mixing: &mixing,
        communities: &communities,
        labels: &labels,
    };
    storage::save_results(&results, &out).unwrap();

    let report = std::fs::read_to_string(out.join("neighbor_prob_cluster.dat")).unwrap();
    assert!(report.lines().any(|l| l == "P(A|A) = 1"));
    assert!(report.lines().any(|l| l == "P(A|B) = 0"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["graph_stats"]["edge_count"], 6);
    assert_eq!(summary["community_stats"]["community_count"], 2);
}
