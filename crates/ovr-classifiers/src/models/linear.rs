//! Linear binary classifiers trained by gradient descent over a partitioned
//! dataset.
//!
//! Every iteration is one map-reduce: each partition computes the summed
//! loss gradient of its rows (or of a seeded random batch of them), the
//! partial gradients are added up, and the weights take one step along the
//! averaged gradient. Labels are read as binary: `> 0.5` is the positive
//! class.
use anyhow::{bail, ensure};
use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::dataset::{
    Dataset, DatasetBuilder, FeatureLabelExtractor, LabeledPartitionData,
    LabeledPartitionDataBuilder, LearningEnvironment, SeedContext, SeedContextBuilder,
};
use crate::models::classifier_trait::{DatasetTrainer, Predict};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearLoss {
    Logistic,
    Hinge,
}

/// Weights and intercept of a linear decision function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearBinaryModel {
    pub weights: Array1<f64>,
    pub intercept: f64,
    pub loss: LinearLoss,
    /// Gradient steps taken so far, across fit and every update.
    pub iterations: usize,
}

impl LinearBinaryModel {
    pub fn zeros(n_features: usize, loss: LinearLoss) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            intercept: 0.0,
            loss,
            iterations: 0,
        }
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub fn decision_function(&self, features: ArrayView1<f64>) -> f64 {
        self.weights.dot(&features) + self.intercept
    }
}

impl Predict for LinearBinaryModel {
    /// Probability of the positive class for logistic models, signed margin
    /// for hinge models.
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        let z = self.decision_function(features);
        match self.loss {
            LinearLoss::Logistic => sigmoid(z),
            LinearLoss::Hinge => z,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Clone, Copy, Debug)]
struct Settings {
    loss: LinearLoss,
    learning_rate: f64,
    max_iterations: usize,
    batch_size: Option<usize>,
    l2_regularization: f64,
    tolerance: f64,
}

impl Settings {
    fn from_config(config: &ModelConfig) -> Self {
        let (loss, max_iterations, batch_size, l2_regularization, tolerance) =
            match config.model_type {
                ModelType::LogisticRegression {
                    max_iterations,
                    batch_size,
                    l2_regularization,
                    tolerance,
                } => (LinearLoss::Logistic, max_iterations, batch_size, l2_regularization, tolerance),
                ModelType::LinearSvm {
                    max_iterations,
                    batch_size,
                    l2_regularization,
                    tolerance,
                } => (LinearLoss::Hinge, max_iterations, batch_size, l2_regularization, tolerance),
            };
        Settings {
            loss,
            learning_rate: config.learning_rate,
            max_iterations,
            batch_size,
            l2_regularization,
            tolerance,
        }
    }
}

/// Trainer for [`LinearBinaryModel`]s.
#[derive(Clone, Debug)]
pub struct LinearClassifierTrainer {
    params: ModelConfig,
    environment: LearningEnvironment,
}

impl LinearClassifierTrainer {
    pub fn new(params: ModelConfig) -> Self {
        LinearClassifierTrainer {
            params,
            environment: LearningEnvironment::default(),
        }
    }

    pub fn with_environment(mut self, environment: LearningEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    fn train<U, B, E>(
        &self,
        initial: Option<LinearBinaryModel>,
        builder: &B,
        extractor: &E,
    ) -> anyhow::Result<LinearBinaryModel>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        let settings = Settings::from_config(&self.params);
        let dataset = builder.build(
            &self.environment,
            SeedContextBuilder,
            LabeledPartitionDataBuilder::new(extractor),
        )?;

        let shape = dataset.compute(|_, data: &LabeledPartitionData| partition_shape(data), merge_shapes)?;
        let Some(shape) = shape else {
            bail!("cannot train a binary classifier on an empty dataset");
        };
        ensure!(
            shape.min_features == shape.max_features,
            "partitions disagree on the number of features ({} vs {})",
            shape.min_features,
            shape.max_features
        );
        let n_features = shape.max_features;

        let mut model = match initial {
            Some(model) => {
                ensure!(
                    model.n_features() == n_features,
                    "cannot update a model with {} features on a dataset with {} features",
                    model.n_features(),
                    n_features
                );
                model
            }
            None => LinearBinaryModel::zeros(n_features, settings.loss),
        };

        log::trace!(
            "Training {:?} model on {} rows with {} features",
            settings.loss,
            shape.rows,
            n_features
        );

        for iteration in 0..settings.max_iterations {
            let step = model.iterations as u64 + iteration as u64;
            let gradient = dataset.compute(
                |context: &SeedContext, data: &LabeledPartitionData| {
                    partition_gradient(&model, context, data, step, &settings)
                },
                merge_gradients,
            )?;
            let Some(gradient) = gradient.filter(|g| g.count > 0) else {
                break;
            };

            let n = gradient.count as f64;
            let mut grad_weights = gradient.weights / n;
            grad_weights.scaled_add(settings.l2_regularization, &model.weights);
            let grad_intercept = gradient.intercept / n;

            model.weights.scaled_add(-settings.learning_rate, &grad_weights);
            model.intercept -= settings.learning_rate * grad_intercept;

            let norm = (grad_weights.dot(&grad_weights) + grad_intercept * grad_intercept).sqrt();
            if norm < settings.tolerance {
                log::trace!("Converged after {} iterations (gradient norm {:.3e})", iteration + 1, norm);
                model.iterations += iteration + 1;
                dataset.close()?;
                return Ok(model);
            }
        }
        model.iterations += settings.max_iterations;

        dataset.close()?;
        Ok(model)
    }
}

impl DatasetTrainer for LinearClassifierTrainer {
    type Model = LinearBinaryModel;

    fn fit<U, B, E>(&self, builder: &B, extractor: &E) -> anyhow::Result<LinearBinaryModel>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        self.train(None, builder, extractor)
    }

    fn update_model<U, B, E>(
        &self,
        model: LinearBinaryModel,
        builder: &B,
        extractor: &E,
    ) -> anyhow::Result<LinearBinaryModel>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        self.train(Some(model), builder, extractor)
    }

    fn is_updateable(&self, model: &LinearBinaryModel) -> bool {
        model.loss == Settings::from_config(&self.params).loss
    }
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    rows: usize,
    min_features: usize,
    max_features: usize,
}

fn partition_shape(data: &LabeledPartitionData) -> Option<Shape> {
    if data.is_empty() {
        return None;
    }
    Some(Shape {
        rows: data.len(),
        min_features: data.n_features(),
        max_features: data.n_features(),
    })
}

fn merge_shapes(a: Option<Shape>, b: Option<Shape>) -> Option<Shape> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Shape {
            rows: a.rows + b.rows,
            min_features: a.min_features.min(b.min_features),
            max_features: a.max_features.max(b.max_features),
        }),
        (a, None) => a,
        (None, b) => b,
    }
}

#[derive(Clone, Debug)]
struct Gradient {
    weights: Array1<f64>,
    intercept: f64,
    count: usize,
}

fn partition_gradient(
    model: &LinearBinaryModel,
    context: &SeedContext,
    data: &LabeledPartitionData,
    step: u64,
    settings: &Settings,
) -> Option<Gradient> {
    let n_rows = data.len();
    if n_rows == 0 {
        return None;
    }

    let rows: Vec<usize> = match settings.batch_size {
        Some(batch) if batch < n_rows => {
            let mut rng = StdRng::seed_from_u64(context.seed.wrapping_add(step));
            (0..batch).map(|_| rng.gen_range(0..n_rows)).collect()
        }
        _ => (0..n_rows).collect(),
    };

    let mut gradient = Gradient {
        weights: Array1::zeros(model.n_features()),
        intercept: 0.0,
        count: rows.len(),
    };
    for row in rows {
        let x = data.features.row(row);
        let positive = data.labels[row] > 0.5;
        let z = model.decision_function(x);
        let residual = match settings.loss {
            LinearLoss::Logistic => sigmoid(z) - if positive { 1.0 } else { 0.0 },
            LinearLoss::Hinge => {
                let y = if positive { 1.0 } else { -1.0 };
                if y * z < 1.0 {
                    -y
                } else {
                    0.0
                }
            }
        };
        if residual != 0.0 {
            gradient.weights.scaled_add(residual, &x);
            gradient.intercept += residual;
        }
    }
    Some(gradient)
}

fn merge_gradients(a: Option<Gradient>, b: Option<Gradient>) -> Option<Gradient> {
    match (a, b) {
        (Some(mut a), Some(b)) => {
            a.weights += &b.weights;
            a.intercept += b.intercept;
            a.count += b.count;
            Some(a)
        }
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnExtractor, LabelColumn, LocalDatasetBuilder};
    use ndarray::array;

    fn separable() -> Vec<Vec<f64>> {
        let mut rows = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            rows.push(vec![-2.0 - jitter, 0.5 + jitter, 0.0]);
            rows.push(vec![2.0 + jitter, -0.5 - jitter, 1.0]);
        }
        rows
    }

    #[test]
    fn logistic_regression_separates_two_clusters() {
        let builder = LocalDatasetBuilder::from_records(separable(), 3);
        let trainer = LinearClassifierTrainer::new(ModelConfig::default());
        let model = trainer
            .fit(&builder, &ColumnExtractor::new(LabelColumn::Last))
            .unwrap();

        assert!(model.predict(array![2.5, -1.0].view()) > 0.9);
        assert!(model.predict(array![-2.5, 1.0].view()) < 0.1);
        assert_eq!(builder.open_datasets(), 0);
    }

    #[test]
    fn svm_margin_has_the_right_sign() {
        let params = ModelConfig::new(0.05, "svm".parse().unwrap());
        let builder = LocalDatasetBuilder::from_records(separable(), 2);
        let model = LinearClassifierTrainer::new(params)
            .fit(&builder, &ColumnExtractor::default())
            .unwrap();

        assert_eq!(model.loss, LinearLoss::Hinge);
        assert!(model.predict(array![2.0, -0.5].view()) > 0.0);
        assert!(model.predict(array![-2.0, 0.5].view()) < 0.0);
    }

    #[test]
    fn update_warm_starts_from_previous_weights() {
        let params = ModelConfig::new(
            0.1,
            ModelType::LogisticRegression {
                max_iterations: 5,
                batch_size: None,
                l2_regularization: 0.0,
                tolerance: 0.0,
            },
        );
        let trainer = LinearClassifierTrainer::new(params);
        let builder = LocalDatasetBuilder::from_records(separable(), 2);
        let extractor = ColumnExtractor::default();

        let first = trainer.fit(&builder, &extractor).unwrap();
        assert_eq!(first.iterations, 5);
        let updated = trainer.update(first.clone(), &builder, &extractor).unwrap();
        assert_eq!(updated.iterations, 10);
        assert!(updated.weights[0] > first.weights[0]);
    }

    #[test]
    fn update_with_other_loss_refits() {
        let trainer = LinearClassifierTrainer::new(ModelConfig::default());
        let stale = LinearBinaryModel::zeros(2, LinearLoss::Hinge);
        assert!(!trainer.is_updateable(&stale));

        let builder = LocalDatasetBuilder::from_records(separable(), 2);
        let model = trainer.update(stale, &builder, &ColumnExtractor::default()).unwrap();
        assert_eq!(model.loss, LinearLoss::Logistic);
    }

    #[test]
    fn update_rejects_feature_width_change() {
        let trainer = LinearClassifierTrainer::new(ModelConfig::default());
        let builder = LocalDatasetBuilder::from_records(separable(), 2);
        let wide = LinearBinaryModel::zeros(5, LinearLoss::Logistic);
        assert!(trainer.update(wide, &builder, &ColumnExtractor::default()).is_err());
        assert_eq!(builder.open_datasets(), 0);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let builder = LocalDatasetBuilder::<Vec<f64>>::from_partitions(vec![Vec::new(), Vec::new()]);
        let trainer = LinearClassifierTrainer::new(ModelConfig::default());
        assert!(trainer.fit(&builder, &ColumnExtractor::default()).is_err());
    }

    #[test]
    fn mini_batches_are_deterministic_for_a_seed() {
        let params = ModelConfig::new(
            0.1,
            ModelType::LogisticRegression {
                max_iterations: 20,
                batch_size: Some(4),
                l2_regularization: 0.01,
                tolerance: 0.0,
            },
        );
        let builder = LocalDatasetBuilder::from_records(separable(), 4);
        let extractor = ColumnExtractor::default();
        let a = LinearClassifierTrainer::new(params.clone())
            .with_environment(LearningEnvironment::new(3))
            .fit(&builder, &extractor)
            .unwrap();
        let b = LinearClassifierTrainer::new(params)
            .with_environment(LearningEnvironment::new(3))
            .fit(&builder, &extractor)
            .unwrap();
        // Partial gradients may be summed in a different order, so compare
        // up to rounding.
        assert_eq!(a.iterations, b.iterations);
        for (wa, wb) in a.weights.iter().zip(b.weights.iter()) {
            assert!((wa - wb).abs() < 1e-9);
        }
        assert!((a.intercept - b.intercept).abs() < 1e-9);
    }
}
