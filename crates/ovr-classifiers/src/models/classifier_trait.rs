use ndarray::ArrayView1;

use crate::dataset::{DatasetBuilder, FeatureLabelExtractor};

/// Contract of a trainer that learns from a partitioned dataset.
///
/// Trainers are immutable configuration: `fit` and `update` take `&self`
/// and may be called concurrently from several threads with the same
/// dataset builder and extractor.
pub trait DatasetTrainer: Send + Sync {
    type Model: Send;

    /// Train a model from scratch.
    fn fit<U, B, E>(&self, builder: &B, extractor: &E) -> anyhow::Result<Self::Model>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>;

    /// Continue training `model` on the dataset. Models this trainer cannot
    /// warm-start from are replaced by a fresh fit.
    fn update<U, B, E>(
        &self,
        model: Self::Model,
        builder: &B,
        extractor: &E,
    ) -> anyhow::Result<Self::Model>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        if self.is_updateable(&model) {
            self.update_model(model, builder, extractor)
        } else {
            log::warn!("Model is not updateable by this trainer; training a new one from scratch");
            self.fit(builder, extractor)
        }
    }

    /// Warm-start training; only called for models accepted by `is_updateable`.
    fn update_model<U, B, E>(
        &self,
        model: Self::Model,
        builder: &B,
        extractor: &E,
    ) -> anyhow::Result<Self::Model>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>;

    fn is_updateable(&self, model: &Self::Model) -> bool;
}

/// Scores a single feature vector.
pub trait Predict {
    fn predict(&self, features: ArrayView1<f64>) -> f64;
}
