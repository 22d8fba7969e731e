//! Discovery of the class labels present in a partitioned dataset.
use std::collections::HashSet;

use crate::dataset::{
    Dataset, DatasetBuilder, EmptyContext, EmptyContextBuilder, FeatureLabelExtractor,
    LabelPartitionData, LabelPartitionDataBuilder, LearningEnvironment,
};
use crate::error::{OvrError, Result};
use crate::label::ClassLabel;

/// Collect the distinct class labels of every record the builder yields.
///
/// A transient dataset holding only labels is built for this purpose and
/// released before returning, whether the computation succeeds or not. The
/// labels come back sorted; an empty dataset yields an empty vector.
pub fn extract_class_labels<U, B, E>(
    builder: &B,
    env: &LearningEnvironment,
    extractor: &E,
) -> Result<Vec<ClassLabel>>
where
    B: DatasetBuilder<U>,
    E: FeatureLabelExtractor<U>,
{
    let dataset = builder
        .build(env, EmptyContextBuilder, LabelPartitionDataBuilder::new(extractor))
        .map_err(OvrError::Dataset)?;

    let labels = dataset
        .compute(
            |_: &EmptyContext, data: &LabelPartitionData| partition_labels(data),
            merge_label_sets,
        )
        .map_err(OvrError::Dataset)?;

    dataset.close().map_err(OvrError::Dataset)?;

    let mut labels: Vec<ClassLabel> = labels.unwrap_or_default().into_iter().collect();
    labels.sort();
    log::debug!("Found {} class labels: {:?}", labels.len(), labels);
    Ok(labels)
}

/// Labels observed in one partition; `None` for an empty partition.
fn partition_labels(data: &LabelPartitionData) -> Option<HashSet<ClassLabel>> {
    if data.is_empty() {
        return None;
    }
    Some(data.labels().iter().copied().map(ClassLabel::from).collect())
}

/// Union of two partial label sets. `None` is the identity; two `None`s
/// combine into the empty set.
pub fn merge_label_sets(
    a: Option<HashSet<ClassLabel>>,
    b: Option<HashSet<ClassLabel>>,
) -> Option<HashSet<ClassLabel>> {
    match (a, b) {
        (None, None) => Some(HashSet::new()),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (Some(a), Some(b)) => {
            let (mut larger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };
            larger.extend(smaller);
            Some(larger)
        }
    }
}
