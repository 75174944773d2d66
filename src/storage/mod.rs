//! Results persistence module

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty, Map, Value};

use crate::analysis::{GraphDistributions, LabelAnalysis};
use crate::cluster::metrics::MixingMatrix;
use crate::cluster::{CommunitySummary, Partition};
use crate::data::table::AttrValue;
use crate::graph::{CompressedGraph, GraphMethod};

/// Everything one pipeline run produces.
pub struct AnalysisResults<'a> {
    pub graph: &'a CompressedGraph,
    pub method: GraphMethod,
    pub distributions: &'a GraphDistributions,
    pub detector: &'a str,
    pub partition: &'a Partition,
    pub mixing: &'a MixingMatrix,
    pub communities: &'a [CommunitySummary],
    pub labels: &'a [LabelAnalysis],
}

/// Write the graph in binary form.
pub fn save_graph(graph: &CompressedGraph, path: &Path) -> Result<()> {
    log::info!("Saving graph to {}", path.display());
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, graph).context("serializing graph")?;
    Ok(())
}

/// Read a graph written by `save_graph`.
pub fn load_graph(path: &Path) -> Result<CompressedGraph> {
    log::info!("Loading graph from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let graph = bincode::deserialize_from(reader).context("deserializing graph")?;
    Ok(graph)
}

/// JSON view of an attribute value.
pub fn attr_to_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(v) => json!(v),
        AttrValue::Int(v) => json!(v),
        // NaN and infinities have no JSON form
        AttrValue::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
        AttrValue::Text(v) => json!(v),
    }
}

/// Node-link JSON dump of the graph.
pub fn graph_to_json(graph: &CompressedGraph) -> Value {
    let nodes: Vec<Value> = graph
        .nodes
        .iter()
        .map(|node| {
            let mut object = Map::new();
            object.insert("id".to_string(), json!(node.index));
            object.insert("embedded".to_string(), json!(node.embedded));
            for (name, value) in node.attributes() {
                object.insert(name.clone(), attr_to_json(value));
            }
            Value::Object(object)
        })
        .collect();

    let links: Vec<Value> = graph
        .edge_list()
        .into_iter()
        .map(|(src, dst, weight)| json!({ "source": src, "target": dst, "weight": weight }))
        .collect();

    json!({
        "directed": graph.directed,
        "nodes": nodes,
        "links": links,
    })
}

/// Save analysis results to the specified directory
pub fn save_results(results: &AnalysisResults<'_>, output_dir: &Path) -> Result<()> {
    log::info!("Saving results to {}", output_dir.display());

    fs::create_dir_all(output_dir)?;

    save_summary(results, output_dir)?;
    save_communities(results, output_dir)?;
    save_distributions(results.distributions, output_dir)?;

    for analysis in results.labels {
        save_label_analysis(analysis, output_dir)?;
    }

    write_json(&output_dir.join("graph.json"), &graph_to_json(results.graph))?;

    log::info!("Results saved successfully");

    Ok(())
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

/// Save summary information
fn save_summary(results: &AnalysisResults<'_>, output_dir: &Path) -> Result<()> {
    log::info!("Saving summary information");

    let graph = results.graph;
    let avg_degree = if graph.node_count == 0 {
        0.0
    } else {
        results.distributions.degree.iter().sum::<usize>() as f64 / graph.node_count as f64
    };
    let isolated = results.distributions.degree.iter().filter(|&&d| d == 0).count();

    let summary = json!({
        "graph_stats": {
            "method": results.method,
            "directed": graph.directed,
            "node_count": graph.node_count,
            "edge_count": graph.edge_count(),
            "avg_degree": avg_degree,
            "isolated_nodes": isolated,
            "embedded_nodes": graph.nodes.iter().filter(|n| n.embedded).count(),
        },
        "degree": results.distributions.degree_summary,
        "betweenness": results.distributions.betweenness_summary,
        "community_stats": {
            "detector": results.detector,
            "community_count": results.partition.len(),
            "largest_community_size": results.communities.first().map_or(0, |c| c.size),
            "smallest_community_size": results.communities.last().map_or(0, |c| c.size),
            "avg_density": if results.communities.is_empty() {
                0.0
            } else {
                results.communities.iter().map(|c| c.density).sum::<f64>() / results.communities.len() as f64
            },
        },
        "attributes": results.labels.iter().map(|l| l.table.attribute()).collect::<Vec<_>>(),
    });

    write_json(&output_dir.join("summary.json"), &summary)
}

/// Save community summaries and the mixing matrix
fn save_communities(results: &AnalysisResults<'_>, output_dir: &Path) -> Result<()> {
    log::info!("Saving {} communities", results.communities.len());

    let communities = json!({
        "detector": results.detector,
        "communities": results.communities,
    });
    write_json(&output_dir.join("communities.json"), &communities)?;

    let mixing = json!({
        "directed": results.mixing.directed,
        "communities": results.mixing.communities,
        "counts": results.mixing.counts.outer_iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
        "total": results.mixing.total(),
    });
    write_json(&output_dir.join("mixing_matrix.json"), &mixing)
}

/// Save raw degree and betweenness sequences
fn save_distributions(distributions: &GraphDistributions, output_dir: &Path) -> Result<()> {
    log::info!("Saving graph distributions");
    write_json(&output_dir.join("distributions.json"), &serde_json::to_value(distributions)?)
}

/// Save the neighbourhood table, probability report, homophily matrix and composition
fn save_label_analysis(analysis: &LabelAnalysis, output_dir: &Path) -> Result<()> {
    let attribute = analysis.table.attribute();
    log::info!("Saving neighbourhood statistics for '{}'", attribute);

    // Neighbourhood table as CSV
    let path = output_dir.join(format!("neighborhood_{}.csv", attribute));
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", analysis.table.column_names().join(","))?;
    for row in &analysis.table.rows {
        let value = row.value.as_ref().map_or(String::new(), |v| v.to_string());
        let columns: Vec<String> = analysis.table.row_values(row).iter().map(|v| v.to_string()).collect();
        writeln!(file, "{},{},{},{}", row.node, value, row.degree, columns.join(","))?;
    }
    file.flush()?;

    // One probability per line
    let path = output_dir.join(format!("neighbor_prob_{}.dat", attribute));
    let mut file = BufWriter::new(File::create(path)?);
    for (i, j, p) in analysis.homophily.pairs() {
        writeln!(file, "P({}|{}) = {}", j, i, p)?;
    }
    file.flush()?;

    let homophily = json!({
        "attribute": attribute,
        "labels": analysis.homophily.labels.iter().map(attr_to_json).collect::<Vec<_>>(),
        "probabilities": analysis.homophily.probabilities.outer_iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
    });
    write_json(&output_dir.join(format!("homophily_{}.json", attribute)), &homophily)?;

    let composition = &analysis.composition;
    let composition_json = json!({
        "attribute": attribute,
        "labels": composition.labels.iter().map(attr_to_json).collect::<Vec<_>>(),
        "communities": composition.communities,
        "counts": composition.counts.outer_iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
    });
    write_json(&output_dir.join(format!("composition_{}.json", attribute)), &composition_json)
}
