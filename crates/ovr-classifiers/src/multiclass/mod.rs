//! One-vs-Rest reduction of multi-class training to binary training.
pub mod binary;
pub mod labels;
pub mod model;
pub mod one_vs_rest;

pub use binary::{binary_label, BinaryLabelExtractor};
pub use labels::{extract_class_labels, merge_label_sets};
pub use model::MultiClassModel;
pub use one_vs_rest::OneVsRestTrainer;
