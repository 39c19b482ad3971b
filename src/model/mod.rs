//! Classifier and persisted model bundle
//!
//! - forest: seeded random forest over encoded match features
//! - artifact: the classifier packaged with its encoders and feature order

pub mod artifact;
pub mod forest;

pub use artifact::TrainedArtifact;
pub use forest::WinnerClassifier;
