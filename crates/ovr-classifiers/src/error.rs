use thiserror::Error;

use crate::label::ClassLabel;

/// Failures surfaced by the One-vs-Rest trainer.
#[derive(Debug, Error)]
pub enum OvrError {
    /// No record produced a class label and there is no previous model to fall back to.
    #[error("no data to train on: the dataset yielded no class labels")]
    EmptyDataset,

    /// Building or computing over the label-extraction dataset failed.
    #[error("failed to extract class labels from the partitioned dataset")]
    Dataset(#[source] anyhow::Error),

    /// The binary trainer failed for one class; the whole round is aborted.
    #[error("failed to train the binary model for class {label}")]
    Training {
        label: ClassLabel,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = OvrError> = std::result::Result<T, E>;
