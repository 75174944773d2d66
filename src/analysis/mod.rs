//! Read-only statistics over a built graph

pub mod distribution;
pub mod homophily;
pub mod neighborhood;

use serde::{Deserialize, Serialize};

use crate::cluster::metrics::{community_composition, CommunityComposition};
use crate::cluster::Partition;
use crate::error::Result;
use crate::graph::CompressedGraph;

pub use distribution::{graph_distributions, DistributionSummary, GraphDistributions};
pub use homophily::{estimate_homophily, HomophilyMatrix};
pub use neighborhood::{profile_neighborhoods, LabelUniverse, NeighborProfile, NeighborhoodTable, ProfileMode};

/// Every label-dependent statistic for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAnalysis {
    pub table: NeighborhoodTable,
    pub homophily: HomophilyMatrix,
    pub composition: CommunityComposition,
}

/// Profile neighbourhoods, estimate homophily and tally community
/// composition for `attribute`, sharing one label universe.
pub fn analyze_label(graph: &CompressedGraph, attribute: &str, partition: &Partition) -> Result<LabelAnalysis> {
    let universe = LabelUniverse::from_graph(graph, attribute)?;
    let table = profile_neighborhoods(graph, &universe, ProfileMode::Counts);
    let homophily = estimate_homophily(&table);
    let composition = community_composition(graph, partition, &universe)?;

    for (i, j, p) in homophily.pairs() {
        log::info!("P({}|{}) = {:.4}", j, i, p);
    }

    Ok(LabelAnalysis {
        table,
        homophily,
        composition,
    })
}
