//! `ovr predict`: score every row of a CSV file with a saved ensemble.
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::ArrayView1;

use ovr_classifiers::io::read_feature_csv;
use ovr_classifiers::ClassLabel;

use crate::saved_model::SavedModel;

/// Outcome for one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// `None` when no class produced a usable score.
    pub label: Option<ClassLabel>,
    /// Score of every class, in label order.
    pub scores: Vec<f64>,
}

pub fn run_prediction<P: AsRef<Path>>(model: &SavedModel, data_path: P) -> Result<Vec<Prediction>> {
    let data = read_feature_csv(&data_path, &model.feature_names)?;
    let predictions: Vec<Prediction> = data
        .rows
        .iter()
        .map(|row| {
            let features = ArrayView1::from(row.as_slice());
            Prediction {
                label: model.ensemble.predict_label(features),
                scores: model
                    .ensemble
                    .scores(features)
                    .into_iter()
                    .map(|(_, score)| score)
                    .collect(),
            }
        })
        .collect();
    log::info!(
        "Predicted {} rows from {}",
        predictions.len(),
        data_path.as_ref().display()
    );
    Ok(predictions)
}

/// Write predictions as CSV: the predicted label followed by one
/// `score_<label>` column per class.
pub fn write_predictions<W: Write>(
    writer: W,
    labels: &[ClassLabel],
    predictions: &[Prediction],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["predicted".to_string()];
    header.extend(labels.iter().map(|label| format!("score_{}", label)));
    writer.write_record(&header)?;

    for prediction in predictions {
        let mut record = Vec::with_capacity(prediction.scores.len() + 1);
        record.push(
            prediction
                .label
                .map(|label| label.to_string())
                .unwrap_or_default(),
        );
        record.extend(prediction.scores.iter().map(|score| score.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush().context("Failed to write predictions")?;
    Ok(())
}
