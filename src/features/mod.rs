//! Feature extraction and encoding
//!
//! Converts raw match data into model-ready features.

pub mod encoding;
pub mod match_repr;
pub mod temporal;

pub use encoding::{CategoricalEncoder, EncoderRegistry};
pub use match_repr::{FeatureDeriver, FeatureVector, FEATURE_NAMES};
pub use temporal::{DateParts, InferenceDefaults};
