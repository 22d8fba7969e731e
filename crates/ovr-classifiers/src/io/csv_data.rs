//! Numeric CSV reader.
//!
//! Files have a header row and one record per line; every cell must parse as
//! a float. Labeled files carry the class label in a named column, which is
//! moved to the end of each record so the rows can be fed to a
//! `ColumnExtractor` with `LabelColumn::Last`.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

/// Records whose last value is the label.
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub feature_names: Vec<String>,
    pub records: Vec<Vec<f64>>,
}

/// Feature-only records.
#[derive(Debug, Clone)]
pub struct FeatureData {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

fn open<P: AsRef<Path>>(path: P) -> Result<(csv::Reader<std::fs::File>, StringRecord)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open CSV file: {}", path.as_ref().display()))?;
    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    Ok((reader, headers))
}

fn parse_cell(record: &StringRecord, col: usize, name: &str, row_idx: usize) -> Result<f64> {
    let raw = record
        .get(col)
        .ok_or_else(|| anyhow!("Missing value for column '{}' at row {}", name, row_idx + 1))?;
    raw.parse::<f64>()
        .with_context(|| format!("Invalid number '{}' in column '{}' at row {}", raw, name, row_idx + 1))
}

/// Read a CSV whose `label_column` holds the class label; all other columns
/// are features.
pub fn read_labeled_csv<P: AsRef<Path>>(path: P, label_column: &str) -> Result<LabeledData> {
    let (mut reader, headers) = open(&path)?;

    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| anyhow!("Missing label column '{}'", label_column))?;
    let feature_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != label_idx)
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();

    let mut records = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", row_idx + 1))?;
        let mut values = Vec::with_capacity(feature_cols.len() + 1);
        for (col, name) in &feature_cols {
            values.push(parse_cell(&record, *col, name, row_idx)?);
        }
        values.push(parse_cell(&record, label_idx, label_column, row_idx)?);
        records.push(values);
    }

    log::debug!(
        "Read {} labeled records with {} features from {}",
        records.len(),
        feature_cols.len(),
        path.as_ref().display()
    );

    Ok(LabeledData {
        feature_names: feature_cols.into_iter().map(|(_, name)| name).collect(),
        records,
    })
}

/// Read the given feature columns, in the given order. Other columns (for
/// example a label column) are ignored.
pub fn read_feature_csv<P: AsRef<Path>>(path: P, feature_names: &[String]) -> Result<FeatureData> {
    let (mut reader, headers) = open(&path)?;

    let cols: Vec<usize> = feature_names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("Missing feature column '{}'", name))
        })
        .collect::<Result<_>>()?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", row_idx + 1))?;
        let row = cols
            .iter()
            .zip(feature_names)
            .map(|(col, name)| parse_cell(&record, *col, name, row_idx))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(FeatureData {
        feature_names: feature_names.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn label_column_moves_to_the_end() {
        let file = write("class,x,y\n2,0.5,1.5\n0, -1.0 ,3\n");
        let data = read_labeled_csv(file.path(), "class").unwrap();
        assert_eq!(data.feature_names, vec!["x", "y"]);
        assert_eq!(data.records, vec![vec![0.5, 1.5, 2.0], vec![-1.0, 3.0, 0.0]]);
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let file = write("x,y\n1,2\n");
        let err = read_labeled_csv(file.path(), "label").unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn non_numeric_cell_is_an_error() {
        let file = write("x,label\nabc,1\n");
        assert!(read_labeled_csv(file.path(), "label").is_err());
    }

    #[test]
    fn feature_columns_follow_the_requested_order() {
        let file = write("label,a,b\n1,10,20\n0,30,40\n");
        let names = vec!["b".to_string(), "a".to_string()];
        let data = read_feature_csv(file.path(), &names).unwrap();
        assert_eq!(data.rows, vec![vec![20.0, 10.0], vec![40.0, 30.0]]);
    }
}
