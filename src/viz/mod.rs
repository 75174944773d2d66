//! Visualization generation module
//!
//! Writes plot-ready artifacts (GraphML, heatmap and histogram tables);
//! drawing them is left to external tools.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;

use crate::analysis::{GraphDistributions, HomophilyMatrix, LabelAnalysis};
use crate::cluster::metrics::{CommunityComposition, MixingMatrix};
use crate::cluster::Partition;
use crate::data::table::AttrValue;
use crate::graph::CompressedGraph;

/// Number of equal-width bins for continuous distributions.
pub const DEFAULT_BINS: usize = 10;

/// Generate visualization artifacts from analysis results
pub fn generate_visualizations(
    graph: &CompressedGraph,
    distributions: &GraphDistributions,
    partition: &Partition,
    mixing: &MixingMatrix,
    labels: &[LabelAnalysis],
    output_dir: &Path,
) -> Result<()> {
    log::info!("Generating visualizations");

    let viz_dir = output_dir.join("visualizations");
    fs::create_dir_all(&viz_dir)?;

    write_graphml(graph, &viz_dir.join("graph.graphml"))?;
    write_node_table(graph, distributions, partition, &viz_dir.join("nodes.csv"))?;
    write_distribution_tables(distributions, &viz_dir)?;
    write_mixing_csv(mixing, &viz_dir.join("mixing_matrix.csv"))?;

    for analysis in labels {
        let attribute = analysis.table.attribute();
        write_heatmap_csv(&analysis.homophily, &viz_dir.join(format!("prob_heatmap_{}.csv", attribute)))?;
        write_composition_csv(
            &analysis.composition,
            &viz_dir.join(format!("community_composition_{}.csv", attribute)),
        )?;
    }

    log::info!("Visualizations generated successfully");

    Ok(())
}

/// Count of nodes at each degree from 0 to the maximum.
pub fn degree_histogram(degrees: &[usize]) -> Vec<(usize, usize)> {
    let max = degrees.iter().copied().max().unwrap_or(0);
    let mut counts = vec![0usize; if degrees.is_empty() { 0 } else { max + 1 }];
    for &d in degrees {
        counts[d] += 1;
    }
    counts.into_iter().enumerate().collect()
}

/// Equal-width bins `(lower, upper, count)` over the value range.
///
/// The last bin includes its upper edge. A constant sequence lands in a
/// single bin.
pub fn binned_histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![(min, max, values.len())];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (min + i as f64 * width, min + (i + 1) as f64 * width, c))
        .collect()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn graphml_type(value: &AttrValue) -> &'static str {
    match value {
        AttrValue::Bool(_) => "boolean",
        AttrValue::Int(_) => "long",
        AttrValue::Float(_) => "double",
        AttrValue::Null | AttrValue::Text(_) => "string",
    }
}

/// Whole graph as GraphML with node attributes and edge weights.
pub fn write_graphml(graph: &CompressedGraph, path: &Path) -> Result<()> {
    log::info!("Writing GraphML to {}", path.display());
    let mut file = BufWriter::new(File::create(path)?);

    // Attribute keys from the first non-missing value of each column
    let mut keys: Vec<(String, &'static str)> = Vec::new();
    if let Some(first) = graph.nodes.first() {
        for (name, _) in first.attributes() {
            let kind = graph
                .nodes
                .iter()
                .filter_map(|n| n.attribute(name))
                .find(|v| !v.is_missing())
                .map_or("string", graphml_type);
            keys.push((name.clone(), kind));
        }
    }

    writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(file, "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">")?;
    for (i, (name, kind)) in keys.iter().enumerate() {
        writeln!(
            file,
            "  <key id=\"d{}\" for=\"node\" attr.name=\"{}\" attr.type=\"{}\"/>",
            i,
            escape_xml(name),
            kind
        )?;
    }
    writeln!(file, "  <key id=\"weight\" for=\"edge\" attr.name=\"weight\" attr.type=\"double\"/>")?;
    writeln!(
        file,
        "  <graph id=\"G\" edgedefault=\"{}\">",
        if graph.directed { "directed" } else { "undirected" }
    )?;

    for node in &graph.nodes {
        writeln!(file, "    <node id=\"n{}\">", node.index)?;
        for (i, (name, _)) in keys.iter().enumerate() {
            if let Some(value) = node.attribute(name).filter(|v| !v.is_missing()) {
                writeln!(file, "      <data key=\"d{}\">{}</data>", i, escape_xml(&value.to_string()))?;
            }
        }
        writeln!(file, "    </node>")?;
    }

    for (edge_id, (src, dst, weight)) in graph.edge_list().into_iter().enumerate() {
        writeln!(
            file,
            "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\"><data key=\"weight\">{}</data></edge>",
            edge_id, src, dst, weight
        )?;
    }

    writeln!(file, "  </graph>")?;
    writeln!(file, "</graphml>")?;
    file.flush()?;

    Ok(())
}

/// Per-node degree, betweenness and community
fn write_node_table(
    graph: &CompressedGraph,
    distributions: &GraphDistributions,
    partition: &Partition,
    path: &Path,
) -> Result<()> {
    let assignment = partition.validate(graph.node_count)?;
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "id,degree,betweenness,community_id")?;
    for node in 0..graph.node_count {
        writeln!(
            file,
            "{},{},{:.6},{}",
            node, distributions.degree[node], distributions.betweenness[node], assignment[node]
        )?;
    }
    file.flush()?;

    Ok(())
}

/// Degree and betweenness histogram tables
fn write_distribution_tables(distributions: &GraphDistributions, viz_dir: &Path) -> Result<()> {
    log::info!("Generating distribution tables");

    let mut file = BufWriter::new(File::create(viz_dir.join("degree_distribution.csv"))?);
    writeln!(file, "degree,count")?;
    for (degree, count) in degree_histogram(&distributions.degree) {
        writeln!(file, "{},{}", degree, count)?;
    }
    file.flush()?;

    let mut file = BufWriter::new(File::create(viz_dir.join("betweenness_distribution.csv"))?);
    writeln!(file, "lower,upper,count")?;
    for (lower, upper, count) in binned_histogram(&distributions.betweenness, DEFAULT_BINS) {
        writeln!(file, "{:.6},{:.6},{}", lower, upper, count)?;
    }
    file.flush()?;

    Ok(())
}

/// Label × label probability grid, rows are node labels
pub fn write_heatmap_csv(homophily: &HomophilyMatrix, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    let header: Vec<String> = homophily.labels.iter().map(|l| l.to_string()).collect();
    writeln!(file, "label_i,{}", header.join(","))?;
    for (label, row) in homophily.labels.iter().zip(homophily.probabilities.outer_iter()) {
        let cells: Vec<String> = row.iter().map(|p| format!("{:.6}", p)).collect();
        writeln!(file, "{},{}", label, cells.join(","))?;
    }
    file.flush()?;

    Ok(())
}

/// Community × community edge counts
pub fn write_mixing_csv(mixing: &MixingMatrix, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    let header: Vec<String> = mixing.communities.iter().map(|c| c.to_string()).collect();
    writeln!(file, "community,{}", header.join(","))?;
    for (community, row) in mixing.communities.iter().zip(mixing.counts.outer_iter()) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writeln!(file, "{},{}", community, cells.join(","))?;
    }
    file.flush()?;

    Ok(())
}

/// Stacked-bar data: label counts per community
pub fn write_composition_csv(composition: &CommunityComposition, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    let header: Vec<String> = composition.labels.iter().map(|l| l.to_string()).collect();
    writeln!(file, "community_id,{}", header.join(","))?;
    for (community, row) in composition.communities.iter().zip(composition.counts.outer_iter()) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writeln!(file, "{},{}", community, cells.join(","))?;
    }
    file.flush()?;

    Ok(())
}
