//! One-vs-Rest trainer.
//!
//! Wraps any binary [`DatasetTrainer`] into a multi-class trainer: the class
//! labels present in the dataset are discovered with a map-reduce pass, and
//! for every label a binary model separating that class from all others is
//! fitted (or updated, when the previous ensemble already has one).
//!
//! NOTE: every binary problem sees the full dataset with unweighted labels,
//! so minority classes are trained against a heavily imbalanced rest.
use rayon::prelude::*;

use crate::config::OneVsRestConfig;
use crate::dataset::{DatasetBuilder, FeatureLabelExtractor, LearningEnvironment};
use crate::error::{OvrError, Result};
use crate::label::ClassLabel;
use crate::models::DatasetTrainer;
use crate::multiclass::binary::BinaryLabelExtractor;
use crate::multiclass::labels::extract_class_labels;
use crate::multiclass::model::MultiClassModel;

pub struct OneVsRestTrainer<T> {
    /// Binary trainer whose hyper-parameters are shared by every class.
    classifier: T,
    environment: LearningEnvironment,
    config: OneVsRestConfig,
}

impl<T: DatasetTrainer> OneVsRestTrainer<T> {
    pub fn new(classifier: T) -> Self {
        Self {
            classifier,
            environment: LearningEnvironment::default(),
            config: OneVsRestConfig::default(),
        }
    }

    /// Environment used for the label discovery pass.
    pub fn with_environment(mut self, environment: LearningEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_config(mut self, config: OneVsRestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn classifier(&self) -> &T {
        &self.classifier
    }

    pub fn config(&self) -> &OneVsRestConfig {
        &self.config
    }

    /// Train a new ensemble. Same as `update(None, ..)`.
    pub fn fit<U, B, E>(&self, builder: &B, extractor: &E) -> Result<MultiClassModel<T::Model>>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        self.update(None, builder, extractor)
    }

    /// Train a new ensemble, warm-starting each class from `previous` where it
    /// has a model for that class.
    ///
    /// The result is always a freshly assembled ensemble. Labels of
    /// `previous` that do not occur in the dataset are dropped unless
    /// `retain_unseen_labels` is set. On a dataset without labels `previous`
    /// is returned unchanged, or [`OvrError::EmptyDataset`] if there is none.
    /// A failure of any single class aborts the whole round.
    ///
    /// `previous` is consumed even when label discovery fails. Callers that
    /// want to retry with the same ensemble run [`Self::class_labels`]
    /// first and pass its result to [`Self::update_with_labels`].
    pub fn update<U, B, E>(
        &self,
        previous: Option<MultiClassModel<T::Model>>,
        builder: &B,
        extractor: &E,
    ) -> Result<MultiClassModel<T::Model>>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        let classes = self.class_labels(builder, extractor)?;
        self.update_with_labels(previous, classes, builder, extractor)
    }

    /// Sorted class labels present in the dataset, using this trainer's
    /// environment.
    pub fn class_labels<U, B, E>(&self, builder: &B, extractor: &E) -> Result<Vec<ClassLabel>>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        extract_class_labels(builder, &self.environment, extractor)
    }

    /// Same as [`Self::update`], with the class labels already discovered.
    pub fn update_with_labels<U, B, E>(
        &self,
        previous: Option<MultiClassModel<T::Model>>,
        classes: Vec<ClassLabel>,
        builder: &B,
        extractor: &E,
    ) -> Result<MultiClassModel<T::Model>>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        if classes.is_empty() {
            return match previous {
                Some(previous) => {
                    log::warn!(
                        "Dataset has no labels; keeping the previous model ({} classes)",
                        previous.len()
                    );
                    Ok(previous)
                }
                None => Err(OvrError::EmptyDataset),
            };
        }

        log::info!(
            "Training {} one-vs-rest binary models{}",
            classes.len(),
            if previous.is_some() { " (update)" } else { "" }
        );

        let mut stale = previous.map(MultiClassModel::into_models).unwrap_or_default();
        let tasks: Vec<(ClassLabel, Option<T::Model>)> = classes
            .into_iter()
            .map(|label| {
                let prior = stale.remove(&label);
                (label, prior)
            })
            .collect();

        let trained: Vec<(ClassLabel, T::Model)> = if self.config.parallel {
            tasks
                .into_par_iter()
                .map(|(label, prior)| self.train_class(label, prior, builder, extractor))
                .collect::<Result<_>>()?
        } else {
            tasks
                .into_iter()
                .map(|(label, prior)| self.train_class(label, prior, builder, extractor))
                .collect::<Result<_>>()?
        };

        let mut ensemble: MultiClassModel<T::Model> = trained.into_iter().collect();

        if !stale.is_empty() {
            let mut unseen: Vec<ClassLabel> = stale.keys().copied().collect();
            unseen.sort();
            if self.config.retain_unseen_labels {
                log::info!("Retaining models of labels absent from the dataset: {:?}", unseen);
                for (label, model) in stale {
                    ensemble.add(label, model);
                }
            } else {
                log::info!("Dropping models of labels absent from the dataset: {:?}", unseen);
            }
        }

        Ok(ensemble)
    }

    fn train_class<U, B, E>(
        &self,
        label: ClassLabel,
        prior: Option<T::Model>,
        builder: &B,
        extractor: &E,
    ) -> Result<(ClassLabel, T::Model)>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        let binary = BinaryLabelExtractor::new(extractor, label);
        let model = match prior {
            Some(prior) => {
                log::debug!("Updating binary model for class {}", label);
                self.classifier.update(prior, builder, &binary)
            }
            None => {
                log::debug!("Fitting binary model for class {}", label);
                self.classifier.fit(builder, &binary)
            }
        }
        .map_err(|source| OvrError::Training { label, source })?;
        Ok((label, model))
    }
}

/// Lets a One-vs-Rest trainer be nested or passed wherever a trainer is
/// expected. Errors are converted into `anyhow::Error` and can be recovered
/// with `downcast_ref::<OvrError>()`.
impl<T: DatasetTrainer> DatasetTrainer for OneVsRestTrainer<T> {
    type Model = MultiClassModel<T::Model>;

    fn fit<U, B, E>(&self, builder: &B, extractor: &E) -> anyhow::Result<Self::Model>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        Ok(OneVsRestTrainer::fit(self, builder, extractor)?)
    }

    fn update_model<U, B, E>(
        &self,
        model: Self::Model,
        builder: &B,
        extractor: &E,
    ) -> anyhow::Result<Self::Model>
    where
        B: DatasetBuilder<U>,
        E: FeatureLabelExtractor<U>,
    {
        Ok(OneVsRestTrainer::update(self, Some(model), builder, extractor)?)
    }

    /// Any ensemble can be refreshed: classes without a usable prior model
    /// are simply fitted from scratch.
    fn is_updateable(&self, _model: &Self::Model) -> bool {
        true
    }
}
