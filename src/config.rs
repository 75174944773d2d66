//! Configuration management for the tabular graph analyzer

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cluster::detection::{ConnectedComponents, GirvanNewman};
use crate::cluster::CommunityDetector;
use crate::data::preprocessing::ScalingMethod;
use crate::error::Result;
use crate::graph::GraphMethod;

/// Which community detector to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CommunityMethod {
    #[default]
    GirvanNewman,
    ConnectedComponents,
}

impl CommunityMethod {
    pub fn detector(&self) -> Box<dyn CommunityDetector> {
        match self {
            CommunityMethod::GirvanNewman => Box::new(GirvanNewman),
            CommunityMethod::ConnectedComponents => Box::new(ConnectedComponents),
        }
    }
}

/// Pipeline configuration. Every field has a default, so a JSON file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input table (CSV or Parquet)
    pub input: Option<PathBuf>,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Graph construction method name
    pub method: String,

    /// Neighbours per node for `knn`
    pub k: usize,

    /// Inclusive bound for `distance_threshold`
    pub distance_threshold: f64,

    /// Inclusive bound for `similarity_threshold`
    pub similarity_threshold: f64,

    /// Store edges as ordered pairs
    pub directed: bool,

    /// Label columns to analyse
    pub target_columns: Vec<String>,

    /// Explicit feature columns; all numeric non-target columns when absent
    pub numeric_columns: Option<Vec<String>>,

    /// Columns never used as features
    pub ignore_columns: Vec<String>,

    pub scaling: ScalingMethod,

    pub community: CommunityMethod,

    /// Skip rendering artifacts
    pub skip_viz: bool,

    /// Worker threads (0 = all cores)
    pub threads: usize,

    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            output_dir: PathBuf::from("graph_results"),
            method: "knn".to_string(),
            k: 5,
            distance_threshold: 0.75,
            similarity_threshold: 0.95,
            directed: false,
            target_columns: Vec::new(),
            numeric_columns: None,
            ignore_columns: Vec::new(),
            scaling: ScalingMethod::Standard,
            community: CommunityMethod::GirvanNewman,
            skip_viz: false,
            threads: 0,
            verbose: false,
        }
    }
}

impl Config {
    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the configured method name and its parameter.
    pub fn graph_method(&self) -> Result<GraphMethod> {
        GraphMethod::from_name(&self.method, self.k, self.distance_threshold, self.similarity_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"method": "distance_threshold", "distance_threshold": 1.5, "target_columns": ["cluster"], "scaling": "min_max"}}"#
        )
        .unwrap();
        drop(file);

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.k, 5);
        assert_eq!(config.scaling, ScalingMethod::MinMax);
        assert_eq!(config.target_columns, vec!["cluster".to_string()]);
        assert_eq!(
            config.graph_method().unwrap(),
            GraphMethod::DistanceThreshold { threshold: 1.5 }
        );
    }

    #[test]
    fn test_invalid_method_name() {
        let config = Config {
            method: "radius".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.graph_method(), Err(GraphError::InvalidMethod(_))));
    }
}
