//! Model evaluation and explainability
//!
//! Accuracy and per-team metrics are always produced. Feature importance is
//! best-effort: if it fails the report carries a warning instead.

pub mod importance;

use rand::SeedableRng;
use serde::Serialize;
use std::fmt;

use crate::data::LabelledRows;
use crate::model::TrainedArtifact;
use crate::training::ClassificationReport;
use crate::{CricketError, ReportConfig, Result};

pub use importance::{permutation_importance, FeatureImportance, ImportancePlot};

/// Everything the reporter produces for one evaluation sample
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub rows: usize,
    pub accuracy: f64,
    pub classification: ClassificationReport,
    pub importance: Option<ImportancePlot>,
    pub warnings: Vec<String>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model Performance ({} rows)", self.rows)?;
        writeln!(f, "───────────────────────────────")?;
        writeln!(f, "Accuracy: {:.2}", self.accuracy)?;
        writeln!(f)?;
        write!(f, "{}", self.classification)?;

        if let Some(plot) = &self.importance {
            writeln!(f)?;
            write!(f, "{}", plot)?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        Ok(())
    }
}

/// Evaluates a trained artifact on labelled rows
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    pub fn new(config: ReportConfig) -> Self {
        Reporter { config }
    }

    /// Accuracy, per-class metrics and (if possible) feature importance
    pub fn evaluate(
        &self,
        artifact: &TrainedArtifact,
        sample: &LabelledRows,
    ) -> Result<EvaluationReport> {
        if sample.is_empty() {
            return Err(CricketError::EmptySample);
        }

        let predicted = artifact.classifier().predict(&sample.rows)?;
        let classification = ClassificationReport::from_predictions(
            &sample.labels,
            &predicted,
            artifact.winner_encoder(),
        )?;

        let mut warnings = Vec::new();
        let importance = match self.importance(artifact, sample) {
            Ok(plot) => Some(plot),
            Err(e) => {
                log::warn!("Feature importance unavailable: {}", e);
                warnings.push(format!("feature importance unavailable: {}", e));
                None
            }
        };

        Ok(EvaluationReport {
            rows: sample.len(),
            accuracy: classification.accuracy,
            classification,
            importance,
            warnings,
        })
    }

    /// Permutation importance on a seeded subsample of at most `sample_size` rows
    pub fn importance(
        &self,
        artifact: &TrainedArtifact,
        sample: &LabelledRows,
    ) -> Result<ImportancePlot> {
        if self.config.sample_size == 0 {
            return Err(CricketError::EmptySample);
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.config.seed);
        let subsample = if sample.len() > self.config.sample_size {
            let mut picked =
                rand::seq::index::sample(&mut rng, sample.len(), self.config.sample_size)
                    .into_vec();
            picked.sort_unstable();
            sample.select(&picked)
        } else {
            sample.clone()
        };

        log::debug!(
            "Computing permutation importance on {} rows",
            subsample.len()
        );
        permutation_importance(
            artifact.classifier(),
            &subsample,
            artifact.feature_names(),
            self.config.n_repeats,
            &mut rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainingPipeline;
    use crate::{MatchRecord, TossDecision, TrainingConfig};
    use chrono::NaiveDate;

    fn outcome() -> crate::training::TrainingOutcome {
        let teams = ["CSK", "MI", "RCB"];
        let records: Vec<MatchRecord> = (0..30)
            .map(|i| {
                let t1 = teams[i % 3];
                let t2 = teams[(i + 1) % 3];
                MatchRecord {
                    team1: t1.to_string(),
                    team2: t2.to_string(),
                    toss_winner: Some(t1.to_string()),
                    toss_decision: Some(if i % 2 == 0 { TossDecision::Bat } else { TossDecision::Field }),
                    venue: Some(format!("Ground {}", i % 3)),
                    city: Some(format!("City {}", i % 3)),
                    date: NaiveDate::from_ymd_opt(2010 + (i / 10) as i32, 4, 1 + (i % 10) as u32),
                    season: None,
                    winner: Some(if i % 4 == 0 { t2 } else { t1 }.to_string()),
                }
            })
            .collect();
        let config = TrainingConfig {
            n_trees: 20,
            ..TrainingConfig::default()
        };
        TrainingPipeline::new(config).run(&records).unwrap()
    }

    #[test]
    fn test_evaluate_holdout() {
        let outcome = outcome();
        let reporter = Reporter::new(ReportConfig::default());

        let report = reporter
            .evaluate(outcome.evaluation_artifact(), outcome.evaluation_rows())
            .unwrap();

        assert_eq!(report.rows, outcome.holdout.len());
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert_eq!(report.classification.total_support(), report.rows);
        let plot = report.importance.as_ref().unwrap();
        assert_eq!(plot.bars.len(), outcome.artifact.feature_names().len());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_importance_failure_is_a_warning() {
        let outcome = outcome();
        let reporter = Reporter::new(ReportConfig {
            sample_size: 0,
            ..ReportConfig::default()
        });

        let report = reporter.evaluate(&outcome.artifact, &outcome.train).unwrap();

        assert!(report.importance.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.rows, outcome.train.len());
    }

    #[test]
    fn test_importance_subsamples() {
        let outcome = outcome();
        let reporter = Reporter::new(ReportConfig {
            sample_size: 5,
            n_repeats: 2,
            seed: 7,
        });

        let plot = reporter.importance(&outcome.artifact, &outcome.train).unwrap();
        assert_eq!(plot.sample_size, 5);
        assert_eq!(plot.n_repeats, 2);
    }

    #[test]
    fn test_empty_sample_is_an_error() {
        let outcome = outcome();
        let reporter = Reporter::new(ReportConfig::default());

        assert!(matches!(
            reporter.evaluate(&outcome.artifact, &LabelledRows::default()),
            Err(CricketError::EmptySample)
        ));
    }
}
