//! Training pipeline: records in, artifact out

use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fmt;

use crate::data::dataset::{DerivedDataset, DropCounts, LabelledRows};
use crate::features::{EncoderRegistry, InferenceDefaults, FEATURE_NAMES};
use crate::model::{TrainedArtifact, WinnerClassifier};
use crate::{CricketError, MatchRecord, Result, TrainingConfig};

/// Row counts for one training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub total_records: usize,
    /// Records that survived derivation
    pub usable_rows: usize,
    pub dropped: DropCounts,
    pub train_rows: usize,
    pub holdout_rows: usize,
    /// Rows the saved model was fitted on
    pub fitted_rows: usize,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} usable (dropped: {}) | train: {}, holdout: {} | saved model fitted on {}",
            self.total_records,
            self.usable_rows,
            self.dropped,
            self.train_rows,
            self.holdout_rows,
            self.fitted_rows
        )
    }
}

/// Everything a training run produces
pub struct TrainingOutcome {
    /// The model to persist
    pub artifact: TrainedArtifact,
    /// Model fitted on the train split only, when `artifact` was refit on all rows
    pub evaluation: Option<TrainedArtifact>,
    pub summary: TrainingSummary,
    pub train: LabelledRows,
    /// Empty when holdout is disabled
    pub holdout: LabelledRows,
}

impl TrainingOutcome {
    /// Model that has not seen the evaluation rows
    pub fn evaluation_artifact(&self) -> &TrainedArtifact {
        self.evaluation.as_ref().unwrap_or(&self.artifact)
    }

    /// Rows to evaluate on: the holdout, or the training rows without one
    pub fn evaluation_rows(&self) -> &LabelledRows {
        if self.holdout.is_empty() {
            &self.train
        } else {
            &self.holdout
        }
    }
}

/// One-shot, seeded training over a batch of match records
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        TrainingPipeline { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit encoders and classifier and package them as an artifact
    pub fn run(&self, records: &[MatchRecord]) -> Result<TrainingOutcome> {
        log::info!("Training on {} records", records.len());

        let registry = EncoderRegistry::fit(records)?;
        let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let derived = DerivedDataset::build(records, &registry, &feature_names)?;

        if derived.rows.is_empty() {
            return Err(CricketError::EmptyTrainingSet {
                total: records.len(),
                dropped: derived.dropped.total(),
            });
        }

        self.check_classes(&derived.rows, &registry)?;

        let (train_idx, holdout_idx) = self.split(&derived.rows.labels);
        let train = derived.rows.select(&train_idx);
        let holdout = derived.rows.select(&holdout_idx);

        let split_model = self.fit_artifact(&derived, &registry, &feature_names, &train_idx)?;
        let (artifact, evaluation) = if self.config.refit_on_full_data && !holdout.is_empty() {
            log::info!("Refitting on all {} usable rows", derived.rows.len());
            let all: Vec<usize> = (0..derived.rows.len()).collect();
            let full_model = self.fit_artifact(&derived, &registry, &feature_names, &all)?;
            (full_model, Some(split_model))
        } else {
            (split_model, None)
        };

        let summary = TrainingSummary {
            total_records: records.len(),
            usable_rows: derived.rows.len(),
            dropped: derived.dropped,
            train_rows: train.len(),
            holdout_rows: holdout.len(),
            fitted_rows: artifact.trained_rows(),
        };
        log::info!("{}", summary);

        Ok(TrainingOutcome {
            artifact,
            evaluation,
            summary,
            train,
            holdout,
        })
    }

    /// Fit a classifier and defaults on the selected rows and bundle them
    fn fit_artifact(
        &self,
        derived: &DerivedDataset,
        registry: &EncoderRegistry,
        feature_names: &[String],
        indices: &[usize],
    ) -> Result<TrainedArtifact> {
        let rows = derived.rows.select(indices);
        let features: Vec<_> = indices.iter().map(|&i| derived.features[i]).collect();
        let defaults = InferenceDefaults::from_rows(&features, registry.cities())?;
        let classifier = WinnerClassifier::fit(&rows.rows, &rows.labels, &self.config)?;

        TrainedArtifact::new(
            classifier,
            registry.clone(),
            feature_names.to_vec(),
            defaults,
            rows.len(),
        )
    }

    /// Seeded shuffle into (train, holdout) indices
    ///
    /// A holdout row whose winner has no other training row is moved back to
    /// the train side, so every class stays learnable.
    fn split(&self, labels: &[u32]) -> (Vec<usize>, Vec<usize>) {
        let n = labels.len();
        let mut indices: Vec<usize> = (0..n).collect();
        if self.config.holdout_fraction <= 0.0 || n < 2 {
            return (indices, Vec::new());
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let n_holdout = ((n as f64 * self.config.holdout_fraction).ceil() as usize).min(n - 1);
        let mut holdout = indices.split_off(n - n_holdout);

        let mut covered: HashSet<u32> = indices.iter().map(|&i| labels[i]).collect();
        let before = holdout.len();
        holdout.retain(|&i| {
            if covered.insert(labels[i]) {
                indices.push(i);
                false
            } else {
                true
            }
        });
        if holdout.len() < before {
            log::debug!(
                "Moved {} holdout rows back to train to keep every winner",
                before - holdout.len()
            );
        }

        (indices, holdout)
    }

    /// The target needs at least two distinct winners
    fn check_classes(&self, rows: &LabelledRows, registry: &EncoderRegistry) -> Result<()> {
        let first = rows.labels[0];
        if rows.labels.iter().all(|&l| l == first) {
            return Err(CricketError::SingleClassTarget {
                class: registry.teams().decode(first)?.to_string(),
            });
        }
        Ok(())
    }
}
