//! End-to-end tests: One-vs-Rest over the built-in linear trainers.

use ndarray::{arr1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ovr_classifiers::config::{ModelConfig, ModelType, OneVsRestConfig};
use ovr_classifiers::dataset::{ColumnExtractor, LearningEnvironment, LocalDatasetBuilder};
use ovr_classifiers::io::{load_json, save_json};
use ovr_classifiers::models::{LinearBinaryModel, LinearClassifierTrainer, LinearLoss, Predict};
use ovr_classifiers::multiclass::{MultiClassModel, OneVsRestTrainer};
use ovr_classifiers::ClassLabel;

const CENTERS: [(f64, f64, f64); 3] = [(0.0, 0.0, 0.0), (6.0, 0.0, 1.0), (0.0, 6.0, 2.0)];

/// Three well separated gaussian-ish blobs, one per class.
fn blobs(per_class: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(per_class * CENTERS.len());
    for _ in 0..per_class {
        for &(x, y, label) in CENTERS.iter() {
            records.push(vec![
                x + rng.gen_range(-1.0..1.0),
                y + rng.gen_range(-1.0..1.0),
                label,
            ]);
        }
    }
    records
}

fn accuracy(model: &MultiClassModel<LinearBinaryModel>, records: &[Vec<f64>]) -> f64 {
    let correct = records
        .iter()
        .filter(|r| {
            model.predict_label(arr1(&r[..2]).view()) == Some(ClassLabel::from(r[2]))
        })
        .count();
    correct as f64 / records.len() as f64
}

fn logistic(max_iterations: usize) -> ModelConfig {
    ModelConfig::new(
        0.1,
        ModelType::LogisticRegression {
            max_iterations,
            batch_size: None,
            l2_regularization: 0.0,
            tolerance: 1e-8,
        },
    )
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn logistic_one_vs_rest_separates_three_blobs() {
    let records = blobs(40, 7);
    let builder = LocalDatasetBuilder::shuffled(records.clone(), 4, 1);
    let trainer = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(400)));

    let model = trainer.fit(&builder, &ColumnExtractor::default()).unwrap();

    assert_eq!(model.len(), 3);
    assert!(accuracy(&model, &records) > 0.9);
    assert_eq!(builder.open_datasets(), 0);
}

#[test]
fn svm_one_vs_rest_separates_three_blobs() {
    let records = blobs(40, 11);
    let builder = LocalDatasetBuilder::from_records(records.clone(), 3);
    let params = ModelConfig::new(0.05, "svm".parse().unwrap());
    let trainer = OneVsRestTrainer::new(LinearClassifierTrainer::new(params))
        .with_config(OneVsRestConfig {
            parallel: false,
            ..Default::default()
        });

    let model = trainer.fit(&builder, &ColumnExtractor::default()).unwrap();

    assert!(model.iter().all(|(_, m)| m.loss == LinearLoss::Hinge));
    assert!(accuracy(&model, &records) > 0.85);
}

#[test]
fn mini_batch_training_is_reproducible() {
    let records = blobs(30, 3);
    let params = ModelConfig::new(
        0.5,
        ModelType::LogisticRegression {
            max_iterations: 100,
            batch_size: Some(8),
            l2_regularization: 0.001,
            tolerance: 0.0,
        },
    );
    let train = || {
        let builder = LocalDatasetBuilder::from_records(records.clone(), 3);
        OneVsRestTrainer::new(
            LinearClassifierTrainer::new(params.clone())
                .with_environment(LearningEnvironment::new(5)),
        )
        .fit(&builder, &ColumnExtractor::default())
        .unwrap()
    };

    let (a, b) = (train(), train());
    assert_eq!(a.labels(), b.labels());
    for label in a.labels() {
        let (ma, mb) = (a.get_model(label).unwrap(), b.get_model(label).unwrap());
        for (wa, wb) in ma.weights.iter().zip(mb.weights.iter()) {
            assert!((wa - wb).abs() < 1e-9);
        }
        assert!((ma.intercept - mb.intercept).abs() < 1e-9);
    }
}

#[test]
fn update_continues_from_previous_weights() {
    let records = blobs(20, 5);
    let builder = LocalDatasetBuilder::from_records(records.clone(), 2);
    let trainer = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(20)));

    let first = trainer.fit(&builder, &ColumnExtractor::default()).unwrap();
    let second = trainer
        .update(Some(first.clone()), &builder, &ColumnExtractor::default())
        .unwrap();

    for label in first.labels() {
        let before = first.get_model(label).unwrap().iterations;
        let after = second.get_model(label).unwrap().iterations;
        assert!(after > before, "class {} was not warm-started", label);
    }
    assert!(accuracy(&second, &records) >= accuracy(&first, &records) - 0.05);
}

#[test]
fn update_with_a_new_class_adds_a_model() {
    let records = blobs(20, 9);
    let (two, three): (Vec<_>, Vec<_>) = (
        records.iter().filter(|r| r[2] < 2.0).cloned().collect(),
        records.clone(),
    );
    let trainer = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(100)));

    let first = trainer
        .fit(&LocalDatasetBuilder::from_records(two, 2), &ColumnExtractor::default())
        .unwrap();
    assert_eq!(first.len(), 2);

    let second = trainer
        .update(
            Some(first),
            &LocalDatasetBuilder::from_records(three, 2),
            &ColumnExtractor::default(),
        )
        .unwrap();
    assert_eq!(second.len(), 3);
    assert_eq!(
        second.get_model(ClassLabel::from(2.0)).unwrap().iterations,
        100
    );
}

// ---------------------------------------------------------------------------
// Prediction and persistence
// ---------------------------------------------------------------------------

#[test]
fn batch_prediction_matches_row_prediction() {
    let records = blobs(10, 13);
    let builder = LocalDatasetBuilder::from_records(records.clone(), 2);
    let model = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(200)))
        .fit(&builder, &ColumnExtractor::default())
        .unwrap();

    let mut features = Array2::zeros((records.len(), 2));
    for (i, r) in records.iter().enumerate() {
        features[[i, 0]] = r[0];
        features[[i, 1]] = r[1];
    }
    let batch = model.predict_batch(features.view());

    for (row, predicted) in features.outer_iter().zip(batch) {
        assert_eq!(model.predict_label(row), predicted);
        assert_eq!(model.predict(row), predicted.map(f64::from).unwrap());
    }
}

#[test]
fn trained_ensemble_survives_json_round_trip() {
    let records = blobs(10, 17);
    let builder = LocalDatasetBuilder::from_records(records.clone(), 2);
    let model = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(50)))
        .fit(&builder, &ColumnExtractor::default())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ensemble.json");
    save_json(&model, &path).unwrap();
    let restored: MultiClassModel<LinearBinaryModel> = load_json(&path).unwrap();

    assert_eq!(restored.labels(), model.labels());
    for r in &records {
        let x = arr1(&r[..2]);
        assert_eq!(restored.predict_label(x.view()), model.predict_label(x.view()));
    }
}

#[test]
fn ensemble_with_a_nan_class_can_be_reloaded() {
    let records = vec![vec![0.0, 0.0], vec![1.0, f64::NAN], vec![2.0, 1.0]];
    let builder = LocalDatasetBuilder::from_records(records, 2);
    let model = OneVsRestTrainer::new(LinearClassifierTrainer::new(logistic(20)))
        .fit(&builder, &ColumnExtractor::default())
        .unwrap();
    assert!(model.contains(ClassLabel::from(f64::NAN)));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ensemble.json");
    save_json(&model, &path).unwrap();
    let restored: MultiClassModel<LinearBinaryModel> = load_json(&path).unwrap();

    assert_eq!(restored.labels(), model.labels());
    assert!(restored.contains(ClassLabel::from(f64::NAN)));
    for x in [0.0, 1.0, 2.0] {
        let features = arr1(&[x]);
        assert_eq!(
            restored.predict_label(features.view()),
            model.predict_label(features.view())
        );
    }
}
