//! Community mixing, composition and density

use std::collections::{BTreeMap, HashSet};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::analysis::neighborhood::LabelUniverse;
use crate::cluster::{CommunitySummary, Partition};
use crate::data::table::AttrValue;
use crate::error::Result;
use crate::graph::CompressedGraph;

/// Edge counts between every ordered pair of communities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixingMatrix {
    /// Community ids, in row / column order.
    pub communities: Vec<usize>,

    pub counts: Array2<u64>,

    pub directed: bool,
}

impl MixingMatrix {
    /// Count for `(source community, target community)`.
    pub fn get(&self, ci: usize, cj: usize) -> Option<u64> {
        let row = self.communities.binary_search(&ci).ok()?;
        let col = self.communities.binary_search(&cj).ok()?;
        Some(self.counts[[row, col]])
    }

    /// Sum of all entries: 2·|E| undirected, |E| directed.
    pub fn total(&self) -> u64 {
        self.counts.sum()
    }
}

/// Count edges between communities.
///
/// The partition must cover the graph's nodes exactly. Undirected edges add
/// to both `(a, b)` and `(b, a)`, so an internal edge adds 2 to the diagonal;
/// directed edges add to `(source, target)` only.
pub fn mixing_matrix(graph: &CompressedGraph, partition: &Partition) -> Result<MixingMatrix> {
    let assignment = partition.validate(graph.node_count)?;
    let communities = partition.community_ids();
    let k = communities.len();

    // Row / column of every community id
    let index: BTreeMap<usize, usize> = communities.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();

    let mut counts = Array2::<u64>::zeros((k, k));
    for (src, dst, _) in graph.edge_list() {
        let (a, b) = (index[&assignment[src]], index[&assignment[dst]]);
        counts[[a, b]] += 1;
        if !graph.directed {
            counts[[b, a]] += 1;
        }
    }

    log::info!(
        "Mixing matrix over {} communities from {} edges",
        k,
        graph.edge_count()
    );

    Ok(MixingMatrix {
        communities,
        counts,
        directed: graph.directed,
    })
}

/// Member label counts of every community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityComposition {
    pub attribute: String,
    pub labels: Vec<AttrValue>,
    pub communities: Vec<usize>,

    /// `counts[[c, l]]`: members of community `c` carrying label `l`;
    /// members without a value fall in the `Null` label.
    pub counts: Array2<u64>,
}

/// Tally the labels of each community's members.
pub fn community_composition(
    graph: &CompressedGraph,
    partition: &Partition,
    universe: &LabelUniverse,
) -> Result<CommunityComposition> {
    partition.validate(graph.node_count)?;
    let communities = partition.community_ids();

    let mut counts = Array2::<u64>::zeros((communities.len(), universe.len()));
    for (row, (_, members)) in partition.iter().enumerate() {
        for &node in members {
            if let Some(col) = universe.column_of(graph.node(node).label(universe.attribute())) {
                counts[[row, col]] += 1;
            }
        }
    }

    Ok(CommunityComposition {
        attribute: universe.attribute().to_string(),
        labels: universe.values().to_vec(),
        communities,
        counts,
    })
}

/// Density and central nodes of every community, largest first.
pub fn community_summaries(graph: &CompressedGraph, partition: &Partition) -> Result<Vec<CommunitySummary>> {
    partition.validate(graph.node_count)?;

    let mut summaries: Vec<CommunitySummary> = partition
        .iter()
        .map(|(id, members)| CommunitySummary {
            id,
            members: members.to_vec(),
            size: members.len(),
            density: calculate_density(graph, members),
            central_nodes: identify_central_nodes(graph, members),
        })
        .collect();

    summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
    Ok(summaries)
}

/// Calculate density (actual edges / potential edges)
pub fn calculate_density(graph: &CompressedGraph, members: &[usize]) -> f64 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }

    let member_set: HashSet<usize> = members.iter().copied().collect();

    // Adjacency entries inside the community; undirected edges appear twice
    let mut entries = 0usize;
    for &src in members {
        for &dst in graph.outgoing_edges(src) {
            if member_set.contains(&(dst as usize)) {
                entries += 1;
            }
        }
    }

    // n * (n - 1) ordered pairs either way
    entries as f64 / (n * (n - 1)) as f64
}

/// Up to five members with the highest degree inside the community.
pub fn identify_central_nodes(graph: &CompressedGraph, members: &[usize]) -> Vec<usize> {
    let member_set: HashSet<usize> = members.iter().copied().collect();

    let mut degrees: Vec<(usize, usize)> = members
        .iter()
        .map(|&node| {
            let mut degree = graph
                .outgoing_edges(node)
                .iter()
                .filter(|&&dst| member_set.contains(&(dst as usize)))
                .count();

            if graph.directed {
                degree += members
                    .iter()
                    .filter(|&&other| other != node && graph.has_edge(other, node as u32))
                    .count();
            }

            (node, degree)
        })
        .collect();

    // Sort by degree (descending), then node index
    degrees.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    degrees.into_iter().take(5).map(|(node, _)| node).collect()
}
