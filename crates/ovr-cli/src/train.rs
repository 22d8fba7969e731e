//! `ovr train` and `ovr update`.
use std::path::Path;

use anyhow::{ensure, Result};

use ovr_classifiers::dataset::{ColumnExtractor, LabelColumn, LearningEnvironment, LocalDatasetBuilder};
use ovr_classifiers::io::read_labeled_csv;
use ovr_classifiers::models::LinearClassifierTrainer;
use ovr_classifiers::multiclass::OneVsRestTrainer;

use crate::config::TrainConfig;
use crate::saved_model::SavedModel;

/// Train an ensemble on `data_path`, warm-starting from `previous` if given.
pub fn run_training<P: AsRef<Path>>(
    config: &TrainConfig,
    data_path: P,
    previous: Option<SavedModel>,
) -> Result<SavedModel> {
    if let Some(previous) = &previous {
        ensure!(
            previous.label_column == config.label_column,
            "Label column '{}' does not match the previous model's label column '{}'",
            config.label_column,
            previous.label_column
        );
    }

    let data = read_labeled_csv(&data_path, &config.label_column)?;

    if let Some(previous) = &previous {
        ensure!(
            previous.feature_names == data.feature_names,
            "Feature columns of {} ({:?}) do not match the previous model ({:?})",
            data_path.as_ref().display(),
            data.feature_names,
            previous.feature_names
        );
    }

    let n_records = data.records.len();
    let builder = if config.shuffle {
        LocalDatasetBuilder::shuffled(data.records, config.n_partitions, config.seed)
    } else {
        LocalDatasetBuilder::from_records(data.records, config.n_partitions)
    };
    log::info!(
        "Loaded {} records with {} features into {} partitions",
        n_records,
        data.feature_names.len(),
        builder.n_partitions()
    );

    let environment = LearningEnvironment::new(config.seed);
    let classifier =
        LinearClassifierTrainer::new(config.model.clone()).with_environment(environment.clone());
    let trainer = OneVsRestTrainer::new(classifier)
        .with_environment(environment)
        .with_config(config.one_vs_rest.clone());

    let ensemble = trainer.update(
        previous.map(|saved| saved.ensemble),
        &builder,
        &ColumnExtractor::new(LabelColumn::Last),
    )?;
    log::info!("Trained models for class labels {:?}", ensemble.labels());

    Ok(SavedModel {
        feature_names: data.feature_names,
        label_column: config.label_column.clone(),
        model: config.model.clone(),
        ensemble,
    })
}
