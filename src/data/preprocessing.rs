//! Feature preprocessing: numeric column selection, missing rows, scaling

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::table::{FeatureMatrix, RawTable};
use crate::error::{GraphError, Result};

/// Per-column scaling applied to the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    None,
    /// Zero mean, unit (population) variance.
    #[default]
    Standard,
    /// Rescale into [0, 1].
    MinMax,
}

/// Output of preprocessing.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Names of the feature columns, in matrix column order.
    pub feature_columns: Vec<String>,

    /// Scaled features of the kept rows.
    pub matrix: FeatureMatrix,

    /// Raw row position of each matrix row.
    pub kept_rows: Vec<usize>,
}

/// Choose the feature columns.
///
/// An explicit list is validated and used as is. Otherwise every numeric
/// column that is neither a target nor ignored is selected.
pub fn select_feature_columns(
    raw: &RawTable,
    explicit: Option<&[String]>,
    targets: &[String],
    ignore: &[String],
) -> Result<Vec<String>> {
    if let Some(columns) = explicit {
        for name in columns {
            if raw.column_index(name).is_none() {
                return Err(GraphError::MissingColumn(name.clone()));
            }
            if !raw.is_numeric(name) {
                return Err(GraphError::InvalidParameter {
                    name: "numeric_columns",
                    message: format!("column '{}' is not numeric", name),
                });
            }
        }
        return Ok(columns.to_vec());
    }

    Ok(raw
        .columns()
        .iter()
        .filter(|c| !targets.contains(c) && !ignore.contains(c))
        .filter(|c| raw.is_numeric(c))
        .cloned()
        .collect())
}

/// Extract the named numeric columns; missing cells become NaN.
pub fn feature_matrix(raw: &RawTable, columns: &[String]) -> Result<FeatureMatrix> {
    let mut values = Array2::<f64>::from_elem((raw.n_rows(), columns.len()), f64::NAN);

    for (j, name) in columns.iter().enumerate() {
        for (i, cell) in raw.column(name)?.into_iter().enumerate() {
            if let Some(v) = cell.as_f64() {
                values[[i, j]] = v;
            }
        }
    }

    Ok(FeatureMatrix::new(values))
}

/// Scale each column in place. Constant columns map to 0.
pub fn scale(matrix: &FeatureMatrix, method: ScalingMethod) -> FeatureMatrix {
    let mut values = matrix.values().clone();

    if method == ScalingMethod::None || values.nrows() == 0 {
        return FeatureMatrix::new(values);
    }

    for mut column in values.axis_iter_mut(Axis(1)) {
        let present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            continue;
        }

        match method {
            ScalingMethod::Standard => {
                let n = present.len() as f64;
                let mean = present.iter().sum::<f64>() / n;
                let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                column.mapv_inplace(|v| if std > 0.0 { (v - mean) / std } else { 0.0 });
            }
            ScalingMethod::MinMax => {
                let min = present.iter().copied().fold(f64::INFINITY, f64::min);
                let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                column.mapv_inplace(|v| if range > 0.0 { (v - min) / range } else { 0.0 });
            }
            ScalingMethod::None => {}
        }
    }

    FeatureMatrix::new(values)
}

/// Select, clean and scale the features of a raw table.
///
/// Rows with a missing cell in any column are dropped, the same rule graph
/// construction uses to reconcile row counts.
pub fn preprocess(
    raw: &RawTable,
    explicit_columns: Option<&[String]>,
    targets: &[String],
    ignore: &[String],
    scaling: ScalingMethod,
) -> Result<Preprocessed> {
    let feature_columns = select_feature_columns(raw, explicit_columns, targets, ignore)?;
    log::info!("Selected {} feature columns: {:?}", feature_columns.len(), feature_columns);

    let full = feature_matrix(raw, &feature_columns)?;
    let kept_rows = raw.complete_rows();
    let dropped = raw.n_rows() - kept_rows.len();
    if dropped > 0 {
        log::warn!("Dropping {} rows with missing values", dropped);
    }

    let matrix = scale(&full.select_rows(&kept_rows), scaling);
    log::info!(
        "Preprocessed matrix: {} rows x {} features ({:?} scaling)",
        matrix.n_rows(),
        matrix.n_features(),
        scaling
    );

    Ok(Preprocessed {
        feature_columns,
        matrix,
        kept_rows,
    })
}
