//! Model inference for predictions

use crate::features::FeatureDeriver;
use crate::model::TrainedArtifact;
use crate::{CricketError, Prediction, PredictionRequest, Result};

/// Predictor for making match predictions
///
/// Borrows a trained artifact read-only, so one artifact can serve any
/// number of predictors at once.
pub struct Predictor<'a> {
    artifact: &'a TrainedArtifact,
}

impl<'a> Predictor<'a> {
    pub fn new(artifact: &'a TrainedArtifact) -> Self {
        Predictor { artifact }
    }

    /// Predict the winner of a single match
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        if request.toss_winner != request.team1 && request.toss_winner != request.team2 {
            return Err(CricketError::InvalidTossWinner {
                toss_winner: request.toss_winner.clone(),
                team1: request.team1.clone(),
                team2: request.team2.clone(),
            });
        }

        let deriver = FeatureDeriver::new(self.artifact.registry());
        let (features, defaulted) = deriver.derive_request(request, self.artifact.defaults())?;
        if !defaulted.is_empty() {
            log::debug!("Using training defaults for: {}", defaulted.join(", "));
        }

        let row = features.to_row(self.artifact.feature_names())?;
        let code = self.artifact.classifier().predict_one(&row)?;
        let winner = self.artifact.winner_encoder().decode(code)?.to_string();

        Ok(Prediction {
            team1: request.team1.clone(),
            team2: request.team2.clone(),
            winner,
            winner_code: code,
            defaulted,
        })
    }

    /// Predict several matches; each one succeeds or fails on its own
    pub fn predict_batch(&self, requests: &[PredictionRequest]) -> Vec<Result<Prediction>> {
        requests.iter().map(|r| self.predict(r)).collect()
    }

    pub fn artifact(&self) -> &TrainedArtifact {
        self.artifact
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction, request: &PredictionRequest) -> String {
    let defaults = if pred.defaulted.is_empty() {
        "none".to_string()
    } else {
        pred.defaulted.join(", ")
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Toss:             {} chose to {}
│  Venue:            {}
│  Predicted winner: {}
│  Defaulted fields: {}
└─────────────────────────────────────────────────┘
"#,
        pred.team1,
        pred.team2,
        request.toss_winner,
        request.toss_decision,
        request.venue,
        pred.winner,
        defaults
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainingPipeline;
    use crate::{MatchRecord, TossDecision, TrainingConfig};
    use chrono::NaiveDate;

    /// Ten matches between A and B at one ground, A winning six
    fn history() -> Vec<MatchRecord> {
        (0..10)
            .map(|i| MatchRecord {
                team1: if i % 2 == 0 { "A" } else { "B" }.to_string(),
                team2: if i % 2 == 0 { "B" } else { "A" }.to_string(),
                toss_winner: Some(if i % 3 == 0 { "B" } else { "A" }.to_string()),
                toss_decision: Some(if i % 4 == 0 { TossDecision::Field } else { TossDecision::Bat }),
                venue: Some("Chepauk".to_string()),
                city: Some("Chennai".to_string()),
                date: NaiveDate::from_ymd_opt(2018, 4, 3 + i as u32),
                season: Some(2018),
                winner: Some(if i < 6 { "A" } else { "B" }.to_string()),
            })
            .collect()
    }

    fn artifact() -> TrainedArtifact {
        let config = TrainingConfig {
            n_trees: 25,
            holdout_fraction: 0.0,
            ..TrainingConfig::default()
        };
        TrainingPipeline::new(config).run(&history()).unwrap().artifact
    }

    #[test]
    fn test_predicts_a_trained_team() {
        let artifact = artifact();
        let request = PredictionRequest::new("A", "B", "A", TossDecision::Bat, "Chepauk");

        let prediction = Predictor::new(&artifact).predict(&request).unwrap();

        assert!(prediction.winner == "A" || prediction.winner == "B");
        assert_eq!(
            artifact.winner_encoder().encode(&prediction.winner).unwrap(),
            prediction.winner_code
        );
        assert_eq!(prediction.defaulted, vec!["date", "season", "city"]);
    }

    #[test]
    fn test_invalid_toss_winner() {
        let artifact = artifact();
        let request = PredictionRequest::new("A", "B", "C", TossDecision::Bat, "Chepauk");

        let err = Predictor::new(&artifact).predict(&request).unwrap_err();
        assert!(matches!(err, CricketError::InvalidTossWinner { toss_winner, .. } if toss_winner == "C"));
    }

    #[test]
    fn test_unknown_venue_and_city() {
        let artifact = artifact();
        let predictor = Predictor::new(&artifact);

        let venue = PredictionRequest::new("A", "B", "B", TossDecision::Field, "Eden Gardens");
        assert!(matches!(
            predictor.predict(&venue),
            Err(CricketError::UnknownCategory { domain, .. }) if domain == "venue"
        ));

        let city = PredictionRequest::new("A", "B", "B", TossDecision::Field, "Chepauk")
            .with_city("Kolkata");
        assert!(matches!(
            predictor.predict(&city),
            Err(CricketError::UnknownCategory { domain, .. }) if domain == "city"
        ));
    }

    #[test]
    fn test_unknown_team() {
        let artifact = artifact();
        let request = PredictionRequest::new("A", "Z", "A", TossDecision::Bat, "Chepauk");

        assert!(matches!(
            Predictor::new(&artifact).predict(&request),
            Err(CricketError::UnknownCategory { domain, value }) if domain == "team" && value == "Z"
        ));
    }

    #[test]
    fn test_batch_keeps_failures_separate() {
        let artifact = artifact();
        let requests = vec![
            PredictionRequest::new("A", "B", "A", TossDecision::Bat, "Chepauk"),
            PredictionRequest::new("A", "B", "X", TossDecision::Bat, "Chepauk"),
            PredictionRequest::new("B", "A", "A", TossDecision::Field, "Chepauk")
                .with_date(NaiveDate::from_ymd_opt(2019, 4, 20).unwrap())
                .with_city("Chennai"),
        ];

        let results = Predictor::new(&artifact).predict_batch(&requests);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().defaulted.is_empty());
    }

    #[test]
    fn test_predictors_share_artifact() {
        let artifact = artifact();
        let request = PredictionRequest::new("A", "B", "A", TossDecision::Bat, "Chepauk");

        let (shared, request) = (&artifact, &request);
        let results: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || Predictor::new(shared).predict(request).unwrap().winner))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
