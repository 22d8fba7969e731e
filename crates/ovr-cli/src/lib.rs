//! Library side of the `ovr` command line tool: configuration loading,
//! training and prediction over CSV files.
pub mod config;
pub mod predict;
pub mod saved_model;
pub mod train;
