//! Feature and label extraction from upstream records.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A feature vector paired with its label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledVector {
    pub features: Array1<f64>,
    pub label: f64,
}

/// Turns an upstream record into features and a label.
///
/// The two halves are independent functions of the record, so a caller can
/// swap one of them out (see `multiclass::BinaryLabelExtractor`) while
/// keeping the other.
pub trait FeatureLabelExtractor<U>: Send + Sync {
    fn features(&self, record: &U) -> Array1<f64>;

    fn label(&self, record: &U) -> f64;

    fn extract(&self, record: &U) -> LabeledVector {
        LabeledVector {
            features: self.features(record),
            label: self.label(record),
        }
    }
}

impl<U, E> FeatureLabelExtractor<U> for &E
where
    E: FeatureLabelExtractor<U> + ?Sized,
{
    fn features(&self, record: &U) -> Array1<f64> {
        (**self).features(record)
    }

    fn label(&self, record: &U) -> f64 {
        (**self).label(record)
    }
}

/// Extractor assembled from a feature function and a label function.
#[derive(Clone)]
pub struct FnExtractor<F, L> {
    features: F,
    label: L,
}

impl<F, L> FnExtractor<F, L> {
    pub fn new<U>(features: F, label: L) -> Self
    where
        F: Fn(&U) -> Array1<f64> + Send + Sync,
        L: Fn(&U) -> f64 + Send + Sync,
    {
        Self { features, label }
    }
}

impl<U, F, L> FeatureLabelExtractor<U> for FnExtractor<F, L>
where
    F: Fn(&U) -> Array1<f64> + Send + Sync,
    L: Fn(&U) -> f64 + Send + Sync,
{
    fn features(&self, record: &U) -> Array1<f64> {
        (self.features)(record)
    }

    fn label(&self, record: &U) -> f64 {
        (self.label)(record)
    }
}

/// Position of the label inside a numeric row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelColumn {
    First,
    Last,
    Index(usize),
}

/// Extractor for plain numeric rows: one column is the label, the remaining
/// columns (in order) are the features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnExtractor {
    label_column: LabelColumn,
}

impl ColumnExtractor {
    pub fn new(label_column: LabelColumn) -> Self {
        Self { label_column }
    }

    fn label_index(&self, width: usize) -> Option<usize> {
        match self.label_column {
            LabelColumn::First if width > 0 => Some(0),
            LabelColumn::Last if width > 0 => Some(width - 1),
            LabelColumn::Index(idx) if idx < width => Some(idx),
            _ => None,
        }
    }
}

impl Default for ColumnExtractor {
    fn default() -> Self {
        Self::new(LabelColumn::Last)
    }
}

impl FeatureLabelExtractor<Vec<f64>> for ColumnExtractor {
    fn features(&self, record: &Vec<f64>) -> Array1<f64> {
        let skip = self.label_index(record.len());
        record
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != skip)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Rows too short to hold the label column yield NaN.
    fn label(&self, record: &Vec<f64>) -> f64 {
        self.label_index(record.len())
            .map(|idx| record[idx])
            .unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn column_extractor_splits_label_from_features() {
        let row = vec![1.0, 2.0, 3.0];

        let last = ColumnExtractor::new(LabelColumn::Last);
        assert_eq!(last.features(&row), array![1.0, 2.0]);
        assert_eq!(last.label(&row), 3.0);

        let first = ColumnExtractor::new(LabelColumn::First);
        assert_eq!(first.features(&row), array![2.0, 3.0]);
        assert_eq!(first.label(&row), 1.0);

        let middle = ColumnExtractor::new(LabelColumn::Index(1));
        assert_eq!(middle.extract(&row).features, array![1.0, 3.0]);
        assert_eq!(middle.extract(&row).label, 2.0);
    }

    #[test]
    fn column_extractor_out_of_range_label_is_nan() {
        let row = vec![1.0];
        let extractor = ColumnExtractor::new(LabelColumn::Index(4));
        assert!(extractor.label(&row).is_nan());
        assert_eq!(extractor.features(&row), array![1.0]);
    }

    #[test]
    fn fn_extractor_uses_both_closures() {
        let extractor = FnExtractor::new(
            |r: &(f64, f64)| array![r.0],
            |r: &(f64, f64)| r.1,
        );
        let record = (4.0, 1.0);
        assert_eq!(extractor.features(&record), array![4.0]);
        assert_eq!(extractor.label(&record), 1.0);
    }
}
