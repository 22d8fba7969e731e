//! The multi-class ensemble: one binary model per class label.
use std::collections::hash_map;
use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayView2};
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::label::ClassLabel;
use crate::models::Predict;

#[derive(Clone, Debug, PartialEq)]
pub struct MultiClassModel<M> {
    models: HashMap<ClassLabel, M>,
}

impl<M> MultiClassModel<M> {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Insert the model of `label`, returning the one it replaces.
    pub fn add(&mut self, label: ClassLabel, model: M) -> Option<M> {
        self.models.insert(label, model)
    }

    pub fn get_model(&self, label: ClassLabel) -> Option<&M> {
        self.models.get(&label)
    }

    pub fn take_model(&mut self, label: ClassLabel) -> Option<M> {
        self.models.remove(&label)
    }

    pub fn contains(&self, label: ClassLabel) -> bool {
        self.models.contains_key(&label)
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> Vec<ClassLabel> {
        let mut labels: Vec<ClassLabel> = self.models.keys().copied().collect();
        labels.sort();
        labels
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, ClassLabel, M> {
        self.models.iter()
    }

    pub fn into_models(self) -> HashMap<ClassLabel, M> {
        self.models
    }
}

impl<M> Default for MultiClassModel<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> FromIterator<(ClassLabel, M)> for MultiClassModel<M> {
    fn from_iter<I: IntoIterator<Item = (ClassLabel, M)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

impl<M> IntoIterator for MultiClassModel<M> {
    type Item = (ClassLabel, M);
    type IntoIter = hash_map::IntoIter<ClassLabel, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.into_iter()
    }
}

impl<M: Predict> MultiClassModel<M> {
    /// Score of every class for one feature vector, in label order.
    pub fn scores(&self, features: ArrayView1<f64>) -> Vec<(ClassLabel, f64)> {
        self.labels()
            .into_iter()
            .map(|label| (label, self.models[&label].predict(features)))
            .collect()
    }

    /// Label whose binary model scores highest. Ties go to the smaller label
    /// and NaN scores are skipped. `None` for an empty ensemble or when every
    /// score is NaN.
    pub fn predict_label(&self, features: ArrayView1<f64>) -> Option<ClassLabel> {
        let mut best: Option<(ClassLabel, f64)> = None;
        for (label, score) in self.scores(features) {
            if score.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((label, score));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Row-wise [`MultiClassModel::predict_label`].
    pub fn predict_batch(&self, features: ArrayView2<f64>) -> Vec<Option<ClassLabel>> {
        features
            .outer_iter()
            .map(|row| self.predict_label(row))
            .collect()
    }
}

impl<M: Predict> Predict for MultiClassModel<M> {
    /// Predicted class label as a number; NaN for an empty ensemble.
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        self.predict_label(features)
            .map(f64::from)
            .unwrap_or(f64::NAN)
    }
}

#[derive(Serialize)]
struct EntryRef<'a, M> {
    label: ClassLabel,
    model: &'a M,
}

#[derive(Deserialize)]
struct Entry<M> {
    label: ClassLabel,
    model: M,
}

/// Serialized as a list of `{label, model}` entries sorted by label.
impl<M: Serialize> Serialize for MultiClassModel<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.models.len()))?;
        for label in self.labels() {
            seq.serialize_element(&EntryRef {
                label,
                model: &self.models[&label],
            })?;
        }
        seq.end()
    }
}

impl<'de, M: Deserialize<'de>> Deserialize<'de> for MultiClassModel<M> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Entry<M>>::deserialize(deserializer)?;
        let mut models = HashMap::with_capacity(entries.len());
        for entry in entries {
            if models.insert(entry.label, entry.model).is_some() {
                return Err(D::Error::custom(format!(
                    "duplicate model for class label {}",
                    entry.label
                )));
            }
        }
        Ok(Self { models })
    }
}
