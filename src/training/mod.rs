//! Model training
//!
//! Training pipeline and classification metrics.

pub mod metrics;
pub mod trainer;

pub use metrics::{ClassMetrics, ClassificationReport};
pub use trainer::{TrainingOutcome, TrainingPipeline, TrainingSummary};
