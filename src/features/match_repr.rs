//! Numeric match representation
//!
//! Turns a raw match (historical record or prediction request) into the
//! fully numeric feature vector the classifier consumes.

use crate::features::encoding::EncoderRegistry;
use crate::features::temporal::{DateParts, InferenceDefaults};
use crate::{CricketError, MatchRecord, PredictionRequest, Result};

/// Canonical feature column order
pub const FEATURE_NAMES: [&str; FeatureVector::DIM] = [
    "team1_code",
    "team2_code",
    "toss_winner_code",
    "toss_decision_encoded",
    "city_code",
    "venue_code",
    "match_day",
    "match_month",
    "match_year",
    "season",
];

/// Features for a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureVector {
    pub team1_code: u32,
    pub team2_code: u32,
    pub toss_winner_code: u32,
    /// 0 = bat, 1 = field
    pub toss_decision_code: u32,
    pub city_code: u32,
    pub venue_code: u32,
    pub match_day: u32,
    pub match_month: u32,
    pub match_year: i32,
    pub season: i32,
}

impl FeatureVector {
    /// Number of features
    pub const DIM: usize = 10;

    /// Look up a feature by column name
    pub fn value(&self, name: &str) -> Option<f64> {
        let v = match name {
            "team1_code" => self.team1_code as f64,
            "team2_code" => self.team2_code as f64,
            "toss_winner_code" => self.toss_winner_code as f64,
            "toss_decision_encoded" => self.toss_decision_code as f64,
            "city_code" => self.city_code as f64,
            "venue_code" => self.venue_code as f64,
            "match_day" => self.match_day as f64,
            "match_month" => self.match_month as f64,
            "match_year" => self.match_year as f64,
            "season" => self.season as f64,
            _ => return None,
        };
        Some(v)
    }

    /// Assemble a row in the given column order
    pub fn to_row<S: AsRef<str>>(&self, feature_names: &[S]) -> Result<Vec<f64>> {
        feature_names
            .iter()
            .map(|name| {
                self.value(name.as_ref()).ok_or_else(|| {
                    CricketError::ArtifactMismatch(format!("unknown feature '{}'", name.as_ref()))
                })
            })
            .collect()
    }

    /// Row in canonical order
    pub fn to_vec(&self) -> Vec<f64> {
        FEATURE_NAMES
            .iter()
            .filter_map(|name| self.value(name))
            .collect()
    }
}

/// Derives feature vectors through a fitted encoder registry
pub struct FeatureDeriver<'a> {
    registry: &'a EncoderRegistry,
}

impl<'a> FeatureDeriver<'a> {
    pub fn new(registry: &'a EncoderRegistry) -> Self {
        FeatureDeriver { registry }
    }

    /// Features of a historical match
    ///
    /// Fails with `MissingFeature` when a required column is blank, and with
    /// `UnknownCategory` when a value falls outside the fitted domains.
    pub fn derive(&self, record: &MatchRecord) -> Result<FeatureVector> {
        let teams = self.registry.teams();

        let toss_winner = record
            .toss_winner
            .as_deref()
            .ok_or(CricketError::MissingFeature("toss_winner"))?;
        let toss_decision = record
            .toss_decision
            .ok_or(CricketError::MissingFeature("toss_decision"))?;
        let city = record
            .city
            .as_deref()
            .ok_or(CricketError::MissingFeature("city"))?;
        let venue = record
            .venue
            .as_deref()
            .ok_or(CricketError::MissingFeature("venue"))?;
        let date = record.date.ok_or(CricketError::MissingFeature("match_date"))?;
        let parts = DateParts::from_date(date);

        Ok(FeatureVector {
            team1_code: teams.encode(&record.team1)?,
            team2_code: teams.encode(&record.team2)?,
            toss_winner_code: teams.encode(toss_winner)?,
            toss_decision_code: toss_decision.code(),
            city_code: self.registry.cities().encode(city)?,
            venue_code: self.registry.venues().encode(venue)?,
            match_day: parts.day,
            match_month: parts.month,
            match_year: parts.year,
            season: record.season.unwrap_or(parts.year),
        })
    }

    /// Encoded winner of a historical match
    pub fn target(&self, record: &MatchRecord) -> Result<u32> {
        let winner = record
            .winner
            .as_deref()
            .ok_or(CricketError::MissingFeature("winner"))?;
        self.registry.teams().encode(winner)
    }

    /// Features of a prediction request, filling blanks from `defaults`
    ///
    /// Returns the vector together with the names of the defaulted fields.
    pub fn derive_request(
        &self,
        request: &PredictionRequest,
        defaults: &InferenceDefaults,
    ) -> Result<(FeatureVector, Vec<String>)> {
        let teams = self.registry.teams();
        let mut defaulted = Vec::new();

        let (day, month, year) = match request.date {
            Some(date) => {
                let parts = DateParts::from_date(date);
                (parts.day, parts.month, parts.year)
            }
            None => {
                defaulted.push("date".to_string());
                (defaults.match_day, defaults.match_month, defaults.match_year)
            }
        };

        let season = match (request.season, request.date) {
            (Some(season), _) => season,
            (None, Some(_)) => year,
            (None, None) => {
                defaulted.push("season".to_string());
                defaults.season
            }
        };

        let city = match request.city.as_deref() {
            Some(city) => city,
            None => {
                defaulted.push("city".to_string());
                defaults.city.as_str()
            }
        };

        let features = FeatureVector {
            team1_code: teams.encode(&request.team1)?,
            team2_code: teams.encode(&request.team2)?,
            toss_winner_code: teams.encode(&request.toss_winner)?,
            toss_decision_code: request.toss_decision.code(),
            city_code: self.registry.cities().encode(city)?,
            venue_code: self.registry.venues().encode(&request.venue)?,
            match_day: day,
            match_month: month,
            match_year: year,
            season,
        };

        Ok((features, defaulted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TossDecision;
    use chrono::NaiveDate;

    fn record() -> MatchRecord {
        MatchRecord {
            team1: "Mumbai".to_string(),
            team2: "Chennai".to_string(),
            toss_winner: Some("Chennai".to_string()),
            toss_decision: Some(TossDecision::Field),
            venue: Some("Wankhede".to_string()),
            city: Some("Mumbai".to_string()),
            date: NaiveDate::from_ymd_opt(2019, 5, 12),
            season: None,
            winner: Some("Mumbai".to_string()),
        }
    }

    fn defaults() -> InferenceDefaults {
        InferenceDefaults {
            match_day: 14,
            match_month: 4,
            match_year: 2018,
            season: 2018,
            city: "Mumbai".to_string(),
        }
    }

    #[test]
    fn test_derive_record() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let features = FeatureDeriver::new(&registry).derive(&records[0]).unwrap();

        assert_eq!(features.team1_code, 1);
        assert_eq!(features.team2_code, 0);
        assert_eq!(features.toss_winner_code, 0);
        assert_eq!(features.toss_decision_code, 1);
        assert_eq!(features.match_day, 12);
        assert_eq!(features.match_month, 5);
        assert_eq!(features.match_year, 2019);
        assert_eq!(features.season, 2019);
    }

    #[test]
    fn test_recorded_season_wins_over_year() {
        let mut rec = record();
        rec.season = Some(2020);
        let registry = EncoderRegistry::fit(std::slice::from_ref(&rec)).unwrap();
        let features = FeatureDeriver::new(&registry).derive(&rec).unwrap();

        assert_eq!(features.season, 2020);
        assert_eq!(features.match_year, 2019);
    }

    #[test]
    fn test_missing_date() {
        let mut rec = record();
        rec.date = None;
        let registry = EncoderRegistry::fit(std::slice::from_ref(&rec)).unwrap();
        let err = FeatureDeriver::new(&registry).derive(&rec).unwrap_err();

        assert!(matches!(err, CricketError::MissingFeature("match_date")));
    }

    #[test]
    fn test_target_uses_team_domain() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let deriver = FeatureDeriver::new(&registry);

        assert_eq!(deriver.target(&records[0]).unwrap(), 1);

        let mut no_result = record();
        no_result.winner = None;
        assert!(matches!(
            deriver.target(&no_result),
            Err(CricketError::MissingFeature("winner"))
        ));
    }

    #[test]
    fn test_row_follows_requested_order() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let features = FeatureDeriver::new(&registry).derive(&records[0]).unwrap();

        let row = features.to_row(&["match_year", "team1_code"]).unwrap();
        assert_eq!(row, vec![2019.0, 1.0]);
        assert_eq!(features.to_vec().len(), FeatureVector::DIM);
        assert!(features.to_row(&["bogus"]).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let request =
            PredictionRequest::new("Mumbai", "Chennai", "Mumbai", TossDecision::Bat, "Wankhede");

        let (features, defaulted) = FeatureDeriver::new(&registry)
            .derive_request(&request, &defaults())
            .unwrap();

        assert_eq!(features.match_day, 14);
        assert_eq!(features.season, 2018);
        assert_eq!(features.toss_decision_code, 0);
        assert_eq!(defaulted, vec!["date", "season", "city"]);
    }

    #[test]
    fn test_request_date_sets_season() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let request =
            PredictionRequest::new("Mumbai", "Chennai", "Mumbai", TossDecision::Bat, "Wankhede")
                .with_date(NaiveDate::from_ymd_opt(2021, 4, 9).unwrap())
                .with_city("Mumbai");

        let (features, defaulted) = FeatureDeriver::new(&registry)
            .derive_request(&request, &defaults())
            .unwrap();

        assert_eq!(features.match_year, 2021);
        assert_eq!(features.season, 2021);
        assert!(defaulted.is_empty());
    }

    #[test]
    fn test_request_unknown_venue() {
        let records = vec![record()];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let request =
            PredictionRequest::new("Mumbai", "Chennai", "Mumbai", TossDecision::Bat, "Eden Gardens");

        let err = FeatureDeriver::new(&registry)
            .derive_request(&request, &defaults())
            .unwrap_err();
        assert!(matches!(err, CricketError::UnknownCategory { domain, .. } if domain == "venue"));
    }
}
