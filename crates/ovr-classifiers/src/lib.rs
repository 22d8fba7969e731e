//! ovr-classifiers: One-vs-Rest multi-class training over partitioned datasets.
//!
//! The crate turns any binary [`DatasetTrainer`](models::DatasetTrainer) into
//! a multi-class trainer. Class labels are discovered with a partition-parallel
//! map-reduce, then one binary model per label is fitted (or warm-started from
//! a previous ensemble) and collected into a
//! [`MultiClassModel`](multiclass::MultiClassModel).
//!
//! The dataset engine is injected through the traits in [`dataset`]; an
//! in-process rayon-backed engine, a linear binary trainer and CSV/JSON
//! helpers are included so the pieces can be used end to end.
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod label;
pub mod models;
pub mod multiclass;

pub use error::{OvrError, Result};
pub use label::ClassLabel;
