use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use tabular_graph::analysis::{analyze_label, graph_distributions};
use tabular_graph::cluster::metrics::{community_summaries, mixing_matrix};
use tabular_graph::config::{CommunityMethod, Config};
use tabular_graph::data::{loader, preprocessing};
use tabular_graph::error::GraphError;
use tabular_graph::graph::GraphBuilder;
use tabular_graph::storage::{self, AnalysisResults};
use tabular_graph::viz;

#[derive(Parser, Debug)]
#[clap(
    name = "tabular-graph",
    about = "Build similarity graphs from tabular data and measure label homophily"
)]
struct Cli {
    /// JSON configuration file; command-line flags override its values
    #[clap(long)]
    config: Option<PathBuf>,

    /// Path to input CSV or Parquet file
    #[clap(long)]
    input: Option<PathBuf>,

    /// Output directory for results
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Graph construction method: knn, distance_threshold or similarity_threshold
    #[clap(long)]
    method: Option<String>,

    /// Neighbours per node for knn
    #[clap(long)]
    k: Option<usize>,

    /// Maximum Euclidean distance for distance_threshold
    #[clap(long)]
    distance_threshold: Option<f64>,

    /// Minimum cosine similarity for similarity_threshold
    #[clap(long)]
    similarity_threshold: Option<f64>,

    /// Build a directed graph
    #[clap(long)]
    directed: bool,

    /// Label column to analyse (repeatable)
    #[clap(long = "attribute")]
    attributes: Vec<String>,

    /// Explicit feature column (repeatable)
    #[clap(long = "feature")]
    features: Vec<String>,

    /// Column excluded from features (repeatable)
    #[clap(long = "ignore")]
    ignore: Vec<String>,

    /// Community detection strategy
    #[clap(long, value_enum)]
    community: Option<CommunityMethod>,

    /// Skip visualizations
    #[clap(long)]
    skip_viz: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long)]
    threads: Option<usize>,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    /// Merge flags over the file configuration.
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(input) = self.input {
            config.input = Some(input);
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(threshold) = self.distance_threshold {
            config.distance_threshold = threshold;
        }
        if let Some(threshold) = self.similarity_threshold {
            config.similarity_threshold = threshold;
        }
        if !self.attributes.is_empty() {
            config.target_columns = self.attributes;
        }
        if !self.features.is_empty() {
            config.numeric_columns = Some(self.features);
        }
        if !self.ignore.is_empty() {
            config.ignore_columns = self.ignore;
        }
        if let Some(community) = self.community {
            config.community = community;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        config.directed |= self.directed;
        config.skip_viz |= self.skip_viz;
        config.verbose |= self.verbose;

        Ok(config)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let config = Cli::parse().into_config()?;

    // Configure logging
    let log_level = if config.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if config.threads > 0 {
        config.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let Some(input) = config.input.clone() else {
        bail!("no input file given (use --input or set \"input\" in the config file)");
    };
    let method = config.graph_method()?;

    log::info!("Starting tabular graph analysis");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", config.output_dir.display());

    std::fs::create_dir_all(&config.output_dir)?;

    // 1. Load and preprocess
    let raw = loader::load_table(&input)?;
    if raw.n_rows() == 0 {
        return Err(GraphError::DegenerateInput(format!("{} has no rows", input.display())).into());
    }

    let pre = preprocessing::preprocess(
        &raw,
        config.numeric_columns.as_deref(),
        &config.target_columns,
        &config.ignore_columns,
        config.scaling,
    )?;

    // 2. Build the graph
    let graph = GraphBuilder::new(method)
        .directed(config.directed)
        .targets(config.target_columns.clone())
        .build_preprocessed(&raw, &pre)?;

    storage::save_graph(&graph, &config.output_dir.join("graph.bin"))?;

    // 3. Structural statistics
    let distributions = graph_distributions(&graph);

    // 4. Communities
    let detector = config.community.detector();
    let partition = detector.detect(&graph)?;
    log::info!("{} found {} communities", detector.name(), partition.len());

    let mixing = mixing_matrix(&graph, &partition)?;
    let communities = community_summaries(&graph, &partition)?;

    // 5. Label statistics
    let labels = config
        .target_columns
        .iter()
        .map(|attribute| analyze_label(&graph, attribute, &partition))
        .collect::<Result<Vec<_>, _>>()?;

    // 6. Save results
    let results = AnalysisResults {
        graph: &graph,
        method,
        distributions: &distributions,
        detector: detector.name(),
        partition: &partition,
        mixing: &mixing,
        communities: &communities,
        labels: &labels,
    };
    storage::save_results(&results, &config.output_dir)?;

    // 7. Generate visualizations if requested
    if !config.skip_viz {
        viz::generate_visualizations(
            &graph,
            &distributions,
            &partition,
            &mixing,
            &labels,
            &config.output_dir,
        )?;
    }

    log::info!("Analysis complete. Results saved to {}", config.output_dir.display());

    Ok(())
}
