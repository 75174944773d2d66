//! Community partitions and detection strategies

pub mod detection;
pub mod metrics;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::CompressedGraph;

/// Assignment of nodes to communities, keyed by community id.
///
/// A partition is only meaningful against a graph whose node set it covers
/// exactly; `validate` checks that and never repairs it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Partition {
    communities: BTreeMap<usize, Vec<usize>>,
}

impl Partition {
    /// Members are sorted; duplicates are kept so validation can report them.
    pub fn new(mut communities: BTreeMap<usize, Vec<usize>>) -> Self {
        for members in communities.values_mut() {
            members.sort_unstable();
        }
        Self { communities }
    }

    /// Community `i` is the `i`-th member list.
    pub fn from_communities(communities: Vec<Vec<usize>>) -> Self {
        Self::new(communities.into_iter().enumerate().collect())
    }

    /// `assignment[node]` is the community of `node`.
    pub fn from_assignment(assignment: &[usize]) -> Self {
        let mut communities: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, &community) in assignment.iter().enumerate() {
            communities.entry(community).or_default().push(node);
        }
        Self::new(communities)
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Community ids in ascending order.
    pub fn community_ids(&self) -> Vec<usize> {
        self.communities.keys().copied().collect()
    }

    pub fn members(&self, id: usize) -> Option<&[usize]> {
        self.communities.get(&id).map(|m| m.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.communities.iter().map(|(&id, m)| (id, m.as_slice()))
    }

    /// Check exact coverage of `0..node_count` and return each node's community.
    pub fn validate(&self, node_count: usize) -> Result<Vec<usize>> {
        let mut assignment: Vec<Option<usize>> = vec![None; node_count];
        let mut extraneous = Vec::new();
        let mut duplicated = Vec::new();

        for (&id, members) in &self.communities {
            for &node in members {
                if node >= node_count {
                    extraneous.push(node);
                } else if assignment[node].is_some() {
                    duplicated.push(node);
                } else {
                    assignment[node] = Some(id);
                }
            }
        }

        let missing: Vec<usize> = assignment
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(node, _)| node)
            .collect();

        if !missing.is_empty() || !extraneous.is_empty() || !duplicated.is_empty() {
            extraneous.sort_unstable();
            extraneous.dedup();
            duplicated.sort_unstable();
            duplicated.dedup();
            return Err(GraphError::PartitionMismatch {
                missing,
                extraneous,
                duplicated,
            });
        }

        Ok(assignment.into_iter().flatten().collect())
    }
}

/// Strategy producing a partition from a graph.
///
/// Analysis code consumes only the resulting `Partition`, so detectors can
/// be swapped freely.
pub trait CommunityDetector {
    fn name(&self) -> &'static str;

    fn detect(&self, graph: &CompressedGraph) -> Result<Partition>;
}

/// Structural summary of one community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    /// Community id from the partition
    pub id: usize,

    /// Members of this community (node indices)
    pub members: Vec<usize>,

    /// Size of the community
    pub size: usize,

    /// Density: internal edges / potential edges
    pub density: f64,

    /// Up to five members with the highest internal degree
    pub central_nodes: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_exact_cover() {
        let p = Partition::from_communities(vec![vec![2, 0], vec![1]]);
        assert_eq!(p.validate(3).unwrap(), vec![0, 1, 0]);
        assert_eq!(p.members(0), Some(&[0, 2][..]));

        let p = Partition::from_assignment(&[1, 1, 0]);
        assert_eq!(p.community_ids(), vec![0, 1]);
        assert_eq!(p.members(1), Some(&[0, 1][..]));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let p = Partition::from_communities(vec![vec![0, 1], vec![1, 7]]);
        match p.validate(4).unwrap_err() {
            GraphError::PartitionMismatch {
                missing,
                extraneous,
                duplicated,
            } => {
                assert_eq!(missing, vec![2, 3]);
                assert_eq!(extraneous, vec![7]);
                assert_eq!(duplicated, vec![1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
