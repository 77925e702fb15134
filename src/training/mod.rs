//! Model training
//!
//! Full-batch training loop, loss function, and metrics tracking.

pub mod metrics;
pub mod trainer;

pub use metrics::{Metrics, TrainingHistory};
pub use trainer::HitTrainer;
