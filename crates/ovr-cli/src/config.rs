//! Training configuration for the CLI.
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use ovr_classifiers::config::{ModelConfig, ModelType, OneVsRestConfig};

/// Parameters of `ovr train` and `ovr update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelConfig,
    pub one_vs_rest: OneVsRestConfig,
    /// Name of the CSV column holding the class label.
    pub label_column: String,
    /// Number of partitions the records are spread over.
    pub n_partitions: usize,
    /// Shuffle records before partitioning.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            one_vs_rest: OneVsRestConfig::default(),
            label_column: "label".to_string(),
            n_partitions: 4,
            shuffle: true,
            seed: 42,
        }
    }
}

impl TrainConfig {
    /// Load the config file and apply command line overrides.
    pub fn from_arguments<P: AsRef<Path>>(config_path: P, matches: &ArgMatches) -> Result<Self> {
        let mut config = load_train_config(config_path)?;

        if let Some(n) = matches.get_one::<usize>("partitions") {
            config.n_partitions = *n;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if let Some(label_column) = matches.get_one::<String>("label_column") {
            config.label_column = label_column.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.model.model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
        }
        if matches.get_flag("sequential") {
            config.one_vs_rest.parallel = false;
        }

        Ok(config)
    }
}

/// Load a training configuration from a JSON file. Missing fields take
/// their default values.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
