//! Tabular file loading (CSV and Parquet) into a `RawTable`

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, DataType, LazyFrame, SerReader};

use crate::data::table::{AttrValue, RawTable};
use crate::error::{GraphError, Result};

/// Load a dataset, choosing the reader from the file extension.
///
/// `.parquet` files go through the lazy Parquet scanner; anything else is
/// read as CSV with a header row.
pub fn load_table(path: &Path) -> Result<RawTable> {
    log::info!("Reading table: {}", path.display());

    if !path.exists() {
        return Err(GraphError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }

    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("parquet"));

    let df = if is_parquet {
        LazyFrame::scan_parquet(path, Default::default())?.collect()?
    } else {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?
    };

    log::info!("File schema: {:?}", df.schema());
    log::info!("Loaded {} rows and {} columns", df.height(), df.width());

    dataframe_to_table(&df)
}

/// Convert a polars frame into a `RawTable`.
///
/// Integer columns stay integral so they can serve as class labels;
/// other numeric columns become floats and everything else text.
pub fn dataframe_to_table(df: &DataFrame) -> Result<RawTable> {
    let height = df.height();
    let mut names = Vec::with_capacity(df.width());
    let mut columns: Vec<Vec<AttrValue>> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        names.push(column.name().to_string());
        let dtype = column.dtype();

        let values: Vec<AttrValue> = if dtype.is_integer() {
            let cast = column.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map_or(AttrValue::Null, AttrValue::Int))
                .collect()
        } else if dtype.is_float() {
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map_or(AttrValue::Null, AttrValue::Float))
                .collect()
        } else if matches!(dtype, DataType::Boolean) {
            column
                .bool()?
                .into_iter()
                .map(|v| v.map_or(AttrValue::Null, AttrValue::Bool))
                .collect()
        } else {
            let cast = column.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map_or(AttrValue::Null, |s| AttrValue::Text(s.to_string())))
                .collect()
        };

        log::debug!("Column {} ({:?}) converted", names.last().map_or("", |s| s.as_str()), dtype);
        columns.push(values);
    }

    let rows = (0..height)
        .map(|i| columns.iter().map(|c| c[i].clone()).collect())
        .collect();

    RawTable::new(names, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "x,y,label").unwrap();
        writeln!(file, "0.5,1,A").unwrap();
        writeln!(file, "1.5,2,B").unwrap();
        drop(file);

        let table = load_table(&path).unwrap();
        assert_eq!(table.columns(), &["x".to_string(), "y".to_string(), "label".to_string()]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[0][0], AttrValue::Float(0.5));
        assert_eq!(table.rows()[1][1], AttrValue::Int(2));
        assert_eq!(table.rows()[1][2], AttrValue::from("B"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_table(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, GraphError::Io(_)));
    }
}
