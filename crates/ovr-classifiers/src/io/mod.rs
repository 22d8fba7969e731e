//! File IO: numeric CSV datasets and JSON model persistence.
pub mod csv_data;
pub mod model_json;

pub use csv_data::{read_feature_csv, read_labeled_csv, FeatureData, LabeledData};
pub use model_json::{load_json, save_json};
