pub mod classifier_trait;
pub mod linear;

pub use classifier_trait::{DatasetTrainer, Predict};
pub use linear::{LinearBinaryModel, LinearClassifierTrainer, LinearLoss};
