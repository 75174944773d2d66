//! Tabular input: loading, typed tables and feature preprocessing

pub mod loader;
pub mod preprocessing;
pub mod table;

pub use table::{AttrValue, FeatureMatrix, NodeRecord, RawTable};
