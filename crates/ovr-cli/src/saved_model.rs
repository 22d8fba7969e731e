use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use ovr_classifiers::config::ModelConfig;
use ovr_classifiers::io::{load_json, save_json};
use ovr_classifiers::models::LinearBinaryModel;
use ovr_classifiers::multiclass::MultiClassModel;

/// A trained ensemble together with what is needed to apply it to a CSV
/// file again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    /// Feature columns, in the order the binary models expect them.
    pub feature_names: Vec<String>,
    pub label_column: String,
    pub model: ModelConfig,
    pub ensemble: MultiClassModel<LinearBinaryModel>,
}

impl SavedModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }
}
