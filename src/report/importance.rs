//! Permutation feature importance
//!
//! A feature's importance is the accuracy lost when its column is shuffled,
//! breaking its link to the target while keeping its distribution.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;

use crate::data::LabelledRows;
use crate::model::WinnerClassifier;
use crate::{CricketError, Result};

/// Importance of one feature column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Mean accuracy drop over all shuffles
    pub mean_drop: f64,
    pub std_drop: f64,
}

/// Importance summary ready for display or export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportancePlot {
    pub baseline_accuracy: f64,
    pub sample_size: usize,
    pub n_repeats: usize,
    /// Sorted by descending mean drop
    pub bars: Vec<FeatureImportance>,
}

impl ImportancePlot {
    /// Horizontal bar chart, longest bar `width` characters
    pub fn render(&self, width: usize) -> String {
        let label_width = self.bars.iter().map(|b| b.feature.len()).max().unwrap_or(0);
        let max_drop = self
            .bars
            .iter()
            .map(|b| b.mean_drop)
            .fold(0.0f64, f64::max);

        let mut out = String::new();
        for bar in &self.bars {
            let len = if max_drop > 0.0 && bar.mean_drop > 0.0 {
                ((bar.mean_drop / max_drop) * width as f64).ceil() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "  {:<lw$}  {:<w$} {:+.4} (±{:.4})\n",
                bar.feature,
                "█".repeat(len),
                bar.mean_drop,
                bar.std_drop,
                lw = label_width,
                w = width
            ));
        }
        out
    }
}

impl fmt::Display for ImportancePlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Permutation importance (baseline accuracy {:.2}, {} rows, {} shuffles)",
            self.baseline_accuracy, self.sample_size, self.n_repeats
        )?;
        write!(f, "{}", self.render(40))
    }
}

/// Measure every column's importance on `sample`
pub fn permutation_importance(
    classifier: &WinnerClassifier,
    sample: &LabelledRows,
    feature_names: &[String],
    n_repeats: usize,
    rng: &mut StdRng,
) -> Result<ImportancePlot> {
    if sample.is_empty() {
        return Err(CricketError::EmptySample);
    }
    if feature_names.len() != classifier.n_features() {
        return Err(CricketError::FeatureMismatch {
            expected: classifier.n_features(),
            found: feature_names.len(),
        });
    }

    let baseline = accuracy(&classifier.predict(&sample.rows)?, &sample.labels);

    let mut bars = Vec::with_capacity(feature_names.len());
    for (col, name) in feature_names.iter().enumerate() {
        let mut drops = Vec::with_capacity(n_repeats);
        for _ in 0..n_repeats {
            let mut column: Vec<f64> = sample.rows.iter().map(|r| r[col]).collect();
            column.shuffle(rng);

            let shuffled: Vec<Vec<f64>> = sample
                .rows
                .iter()
                .zip(&column)
                .map(|(row, &v)| {
                    let mut row = row.clone();
                    row[col] = v;
                    row
                })
                .collect();

            let acc = accuracy(&classifier.predict(&shuffled)?, &sample.labels);
            drops.push(baseline - acc);
        }

        let (mean, std) = mean_std(&drops);
        bars.push(FeatureImportance {
            feature: name.clone(),
            mean_drop: mean,
            std_drop: std,
        });
    }

    bars.sort_by(|a, b| b.mean_drop.total_cmp(&a.mean_drop));

    Ok(ImportancePlot {
        baseline_accuracy: baseline,
        sample_size: sample.len(),
        n_repeats,
        bars,
    })
}

fn accuracy(predicted: &[u32], truth: &[u32]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
