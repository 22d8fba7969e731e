use ndarray::Array1;

use crate::dataset::FeatureLabelExtractor;
use crate::label::ClassLabel;

/// One-hot transform of a single label: `1.0` when `label` is exactly
/// `target`, `0.0` otherwise.
pub fn binary_label(label: f64, target: ClassLabel) -> f64 {
    if ClassLabel::from(label) == target {
        1.0
    } else {
        0.0
    }
}

/// Wraps an extractor so that its labels become "is `target`" / "is not".
/// Features are passed through untouched.
#[derive(Clone, Copy, Debug)]
pub struct BinaryLabelExtractor<'a, E> {
    inner: &'a E,
    target: ClassLabel,
}

impl<'a, E> BinaryLabelExtractor<'a, E> {
    pub fn new(inner: &'a E, target: ClassLabel) -> Self {
        Self { inner, target }
    }

    pub fn target(&self) -> ClassLabel {
        self.target
    }
}

impl<U, E> FeatureLabelExtractor<U> for BinaryLabelExtractor<'_, E>
where
    E: FeatureLabelExtractor<U>,
{
    fn features(&self, record: &U) -> Array1<f64> {
        self.inner.features(record)
    }

    fn label(&self, record: &U) -> f64 {
        binary_label(self.inner.label(record), self.target)
    }
}
