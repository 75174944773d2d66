//! Core library functions for the tabular graph analyzer

pub mod analysis;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;
pub mod viz;

#[cfg(test)]
mod test_support;

pub use analysis::{analyze_label, LabelAnalysis};
pub use cluster::{CommunityDetector, Partition};
pub use config::Config;
pub use error::{GraphError, Result};
pub use graph::{CompressedGraph, GraphBuilder, GraphMethod};
