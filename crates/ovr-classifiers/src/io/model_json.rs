use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Write `value` as pretty-printed JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::ClassLabel;
    use crate::models::{LinearBinaryModel, LinearLoss};
    use crate::multiclass::MultiClassModel;

    #[test]
    fn ensemble_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut model = MultiClassModel::new();
        model.add(ClassLabel::new(0.0), LinearBinaryModel::zeros(3, LinearLoss::Logistic));
        model.add(ClassLabel::new(4.0), LinearBinaryModel::zeros(3, LinearLoss::Logistic));
        save_json(&model, &path).unwrap();

        let restored: MultiClassModel<LinearBinaryModel> = load_json(&path).unwrap();
        assert_eq!(restored.labels(), model.labels());
        assert_eq!(restored, model);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result: Result<MultiClassModel<LinearBinaryModel>> = load_json("/nonexistent/model.json");
        assert!(result.is_err());
    }
}
