//! Prediction and inference
//!
//! Apply a trained artifact to new match descriptions.

pub mod inference;

pub use inference::{format_prediction, Predictor};
