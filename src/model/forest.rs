//! Random forest winner classifier
//!
//! Thin wrapper around smartcore's random forest that remembers the input
//! width it was fitted with and the set of classes it can emit.

use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::{CricketError, Result, TrainingConfig};

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Seeded random forest over encoded match features
#[derive(Debug, Serialize, Deserialize)]
pub struct WinnerClassifier {
    forest: Forest,
    n_features: usize,
    /// Distinct target codes seen during fitting, ascending
    classes: Vec<u32>,
}

impl WinnerClassifier {
    /// Fit on rows of equal width against encoded winners
    pub fn fit(rows: &[Vec<f64>], labels: &[u32], config: &TrainingConfig) -> Result<Self> {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(CricketError::FeatureMismatch {
                expected: n_features,
                found: bad.len(),
            });
        }
        if rows.len() != labels.len() {
            return Err(CricketError::Classifier(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let x = to_matrix(rows)?;
        let y = labels.to_vec();
        let forest = Forest::fit(&x, &y, forest_parameters(config)?)
            .map_err(|e| CricketError::Classifier(e.to_string()))?;

        log::debug!(
            "Fitted {} trees on {} rows x {} features ({} classes)",
            config.n_trees,
            rows.len(),
            n_features,
            classes.len()
        );

        Ok(WinnerClassifier {
            forest,
            n_features,
            classes,
        })
    }

    /// Predict the winner code for each row
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u32>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in rows {
            self.check_width(row)?;
        }
        let x = to_matrix(rows)?;
        self.forest
            .predict(&x)
            .map_err(|e| CricketError::Classifier(e.to_string()))
    }

    /// Predict the winner code for a single row
    pub fn predict_one(&self, row: &[f64]) -> Result<u32> {
        self.check_width(row)?;
        self.predict(&[row.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| CricketError::Classifier("No prediction returned".to_string()))
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.n_features {
            return Err(CricketError::FeatureMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        Ok(())
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| CricketError::Classifier(format!("Matrix creation failed: {}", e)))
}

fn forest_parameters(config: &TrainingConfig) -> Result<RandomForestClassifierParameters> {
    let n_trees = config
        .n_trees
        .try_into()
        .map_err(|_| CricketError::Config(format!("n_trees {} is too large", config.n_trees)))?;

    let mut params = RandomForestClassifierParameters::default()
        .with_n_trees(n_trees)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_seed(config.seed);
    if let Some(depth) = config.max_depth {
        params = params.with_max_depth(depth);
    }
    Ok(params)
}
