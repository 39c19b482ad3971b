//! Data ingestion
//!
//! CSV loading and derivation of labelled training rows.

pub mod dataset;
pub mod loader;

pub use dataset::{DerivedDataset, DropCounts, LabelledRows};
pub use loader::load_matches;
