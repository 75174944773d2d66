//! Graph representation, construction and algorithms

pub mod algorithms;
pub mod builder;
pub mod compressed;
pub mod distance;

pub use builder::{GraphBuilder, GraphMethod};
pub use compressed::CompressedGraph;
pub use distance::{DistanceMatrix, Metric};
