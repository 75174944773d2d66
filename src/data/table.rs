//! In-memory tabular inputs: raw attribute table, feature matrix, node records

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// A single cell of the raw table.
///
/// Floats compare by total order so values can key label maps; `Null`
/// sorts first and marks a missing cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// True for `Null` and for NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            AttrValue::Null => true,
            AttrValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AttrValue::Null => 0,
            AttrValue::Bool(_) => 1,
            AttrValue::Int(_) => 2,
            AttrValue::Float(_) => 3,
            AttrValue::Text(_) => 4,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => Ordering::Equal,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a.cmp(b),
            (AttrValue::Int(a), AttrValue::Int(b)) => a.cmp(b),
            (AttrValue::Float(a), AttrValue::Float(b)) => a.total_cmp(b),
            (AttrValue::Text(a), AttrValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for AttrValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            AttrValue::Null => {}
            AttrValue::Bool(v) => v.hash(state),
            AttrValue::Int(v) => v.hash(state),
            AttrValue::Float(v) => v.to_bits().hash(state),
            AttrValue::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

/// Dense numeric matrix, one row per dataset record.
///
/// Row order defines node identity: row `i` becomes node `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Build from row vectors; all rows must share one length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(0, |r| r.len());
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GraphError::InputShapeMismatch(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                width
            )));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| GraphError::InputShapeMismatch(e.to_string()))?;
        Ok(Self { values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Keep only the listed rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            values: self.values.select(ndarray::Axis(0), rows),
        }
    }
}

/// Attributes attached to a graph node.
///
/// Declared target (label) columns are held apart from the pass-through
/// columns so analysis code can look them up without scanning every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node index, equal to the raw row position.
    pub index: usize,

    /// Whether the row took part in distance computation.
    pub embedded: bool,

    /// Declared label columns.
    pub targets: BTreeMap<String, AttrValue>,

    /// Remaining original columns.
    pub extra: BTreeMap<String, AttrValue>,
}

impl NodeRecord {
    /// Look up an attribute by column name, targets first.
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.targets.get(name).or_else(|| self.extra.get(name))
    }

    /// The attribute value, or `None` when absent or missing.
    pub fn label(&self, name: &str) -> Option<&AttrValue> {
        self.attribute(name).filter(|v| !v.is_missing())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.targets.contains_key(name) || self.extra.contains_key(name)
    }

    /// All attributes in column-name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        let mut all: Vec<(&String, &AttrValue)> = self.targets.iter().chain(self.extra.iter()).collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all.into_iter()
    }
}

/// Original dataset: named columns and one row of values per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<AttrValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<AttrValue>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(GraphError::InputShapeMismatch(format!(
                "row {} has {} cells, table has {} columns",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<AttrValue>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column.
    pub fn column(&self, name: &str) -> Result<Vec<&AttrValue>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| GraphError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// A column is numeric when every non-missing cell is an int or float.
    pub fn is_numeric(&self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().all(|r| r[idx].is_missing() || r[idx].as_f64().is_some()),
            None => false,
        }
    }

    /// Row positions with no missing cell in any column.
    pub fn complete_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.iter().any(AttrValue::is_missing))
            .map(|(i, _)| i)
            .collect()
    }

    /// Node record for a row, splitting declared targets from the rest.
    pub fn node_record(&self, row: usize, targets: &[String], embedded: bool) -> NodeRecord {
        let mut record = NodeRecord {
            index: row,
            embedded,
            targets: BTreeMap::new(),
            extra: BTreeMap::new(),
        };

        for (name, value) in self.columns.iter().zip(&self.rows[row]) {
            if targets.contains(name) {
                record.targets.insert(name.clone(), value.clone());
            } else {
                record.extra.insert(name.clone(), value.clone());
            }
        }

        record
    }
}
