//! Partition-local data built through a [`FeatureLabelExtractor`].
use anyhow::{ensure, Context};
use ndarray::{Array1, Array2};

use crate::dataset::{FeatureLabelExtractor, LearningEnvironment, PartitionDataBuilder};

/// Labels of one partition, in upstream order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelPartitionData {
    labels: Vec<f64>,
}

impl LabelPartitionData {
    pub fn new(labels: Vec<f64>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds [`LabelPartitionData`]; only the label half of the extractor is used.
pub struct LabelPartitionDataBuilder<'a, E> {
    extractor: &'a E,
}

impl<'a, E> LabelPartitionDataBuilder<'a, E> {
    pub fn new(extractor: &'a E) -> Self {
        Self { extractor }
    }
}

impl<U, C, E> PartitionDataBuilder<U, C, LabelPartitionData> for LabelPartitionDataBuilder<'_, E>
where
    E: FeatureLabelExtractor<U>,
{
    fn build(
        &self,
        _env: &LearningEnvironment,
        upstream: &[U],
        _context: &C,
    ) -> anyhow::Result<LabelPartitionData> {
        Ok(LabelPartitionData::new(
            upstream.iter().map(|record| self.extractor.label(record)).collect(),
        ))
    }
}

/// Feature matrix (one row per record) and aligned labels of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledPartitionData {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
}

impl LabeledPartitionData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Builds [`LabeledPartitionData`]. Every record of a partition must yield
/// the same number of features.
pub struct LabeledPartitionDataBuilder<'a, E> {
    extractor: &'a E,
}

impl<'a, E> LabeledPartitionDataBuilder<'a, E> {
    pub fn new(extractor: &'a E) -> Self {
        Self { extractor }
    }
}

impl<U, C, E> PartitionDataBuilder<U, C, LabeledPartitionData> for LabeledPartitionDataBuilder<'_, E>
where
    E: FeatureLabelExtractor<U>,
{
    fn build(
        &self,
        env: &LearningEnvironment,
        upstream: &[U],
        _context: &C,
    ) -> anyhow::Result<LabeledPartitionData> {
        let mut width = None;
        let mut flat = Vec::new();
        let mut labels = Vec::with_capacity(upstream.len());

        for (row, record) in upstream.iter().enumerate() {
            let vector = self.extractor.extract(record);
            let n = *width.get_or_insert(vector.features.len());
            ensure!(
                vector.features.len() == n,
                "partition {}: record {} has {} features, expected {}",
                env.partition(),
                row,
                vector.features.len(),
                n
            );
            flat.extend(vector.features.iter().copied());
            labels.push(vector.label);
        }

        let features = Array2::from_shape_vec((labels.len(), width.unwrap_or(0)), flat)
            .with_context(|| format!("partition {}: invalid feature matrix", env.partition()))?;

        Ok(LabeledPartitionData {
            features,
            labels: Array1::from_vec(labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnExtractor, EmptyContext, LabelColumn};

    #[test]
    fn labeled_builder_stacks_rows() {
        let extractor = ColumnExtractor::new(LabelColumn::Last);
        let upstream = vec![vec![1.0, 2.0, 0.0], vec![3.0, 4.0, 1.0]];
        let data = LabeledPartitionDataBuilder::new(&extractor)
            .build(&LearningEnvironment::default(), &upstream, &EmptyContext)
            .unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.n_features(), 2);
        assert_eq!(data.features[(1, 0)], 3.0);
        assert_eq!(data.labels.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn labeled_builder_rejects_ragged_rows() {
        let extractor = ColumnExtractor::new(LabelColumn::Last);
        let upstream = vec![vec![1.0, 2.0, 0.0], vec![3.0, 1.0]];
        let result = LabeledPartitionDataBuilder::new(&extractor).build(
            &LearningEnvironment::default(),
            &upstream,
            &EmptyContext,
        );
        assert!(result.is_err());
    }

    #[test]
    fn label_builder_keeps_upstream_order() {
        let extractor = ColumnExtractor::new(LabelColumn::First);
        let upstream = vec![vec![2.0, 9.0], vec![0.0, 9.0], vec![2.0, 9.0]];
        let data = LabelPartitionDataBuilder::new(&extractor)
            .build(&LearningEnvironment::default(), &upstream, &EmptyContext)
            .unwrap();
        assert_eq!(data.labels(), &[2.0, 0.0, 2.0]);
    }

    #[test]
    fn empty_partition_builds_empty_matrix() {
        let extractor = ColumnExtractor::default();
        let upstream: Vec<Vec<f64>> = Vec::new();
        let data = LabeledPartitionDataBuilder::new(&extractor)
            .build(&LearningEnvironment::default(), &upstream, &EmptyContext)
            .unwrap();
        assert!(data.is_empty());
        assert_eq!(data.features.shape(), &[0, 0]);
    }
}
