use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Configuration of the built-in linear binary trainer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub learning_rate: f64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported binary model types and their hyper-parameters.
///
/// `batch_size` enables mini-batch training: each partition samples that many
/// rows (with replacement) per iteration. `None` uses every row.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    LogisticRegression {
        max_iterations: usize,
        batch_size: Option<usize>,
        l2_regularization: f64,
        tolerance: f64,
    },
    LinearSvm {
        max_iterations: usize,
        batch_size: Option<usize>,
        l2_regularization: f64,
        tolerance: f64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::LogisticRegression {
            max_iterations: 500,
            batch_size: None,
            l2_regularization: 0.0,
            tolerance: 1e-6,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "logistic_regression" => Ok(ModelType::default()),
            "svm" | "linear_svm" => Ok(ModelType::LinearSvm {
                max_iterations: 500,
                batch_size: None,
                l2_regularization: 0.01,
                tolerance: 1e-6,
            }),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: logistic, svm",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f64, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// Behaviour of the One-vs-Rest orchestration itself.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OneVsRestConfig {
    /// Train the per-class binary models concurrently on the rayon pool.
    pub parallel: bool,
    /// On update, keep models of labels that no longer occur in the dataset.
    /// When `false` those models are dropped from the new ensemble.
    pub retain_unseen_labels: bool,
}

impl Default for OneVsRestConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            retain_unseen_labels: false,
        }
    }
}
