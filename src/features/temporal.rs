//! Date-derived features and training-time defaults
//!
//! Training rows must carry a date. Predictions may omit it, in which case
//! the medians observed over the training rows are used instead.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::features::encoding::CategoricalEncoder;
use crate::features::match_repr::FeatureVector;
use crate::{CricketError, Result};

/// Calendar parts of a match date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl DateParts {
    pub fn from_date(date: NaiveDate) -> Self {
        DateParts {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }
}

/// Values substituted for fields a prediction request leaves out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceDefaults {
    pub match_day: u32,
    pub match_month: u32,
    pub match_year: i32,
    pub season: i32,
    /// Most frequent city among training rows
    pub city: String,
}

impl InferenceDefaults {
    /// Compute defaults from the rows the classifier is fitted on
    pub fn from_rows(rows: &[FeatureVector], cities: &CategoricalEncoder) -> Result<Self> {
        if rows.is_empty() {
            return Err(CricketError::MissingFeature("match_date"));
        }

        let days: Vec<i64> = rows.iter().map(|r| r.match_day as i64).collect();
        let months: Vec<i64> = rows.iter().map(|r| r.match_month as i64).collect();
        let years: Vec<i64> = rows.iter().map(|r| r.match_year as i64).collect();
        let seasons: Vec<i64> = rows.iter().map(|r| r.season as i64).collect();

        let mut city_counts: HashMap<u32, usize> = HashMap::new();
        for row in rows {
            *city_counts.entry(row.city_code).or_insert(0) += 1;
        }
        // Ties go to the lowest code, i.e. the alphabetically first city
        let city_code = city_counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(code, _)| code)
            .ok_or(CricketError::MissingFeature("city"))?;

        Ok(InferenceDefaults {
            match_day: median(&days) as u32,
            match_month: median(&months) as u32,
            match_year: median(&years) as i32,
            season: median(&seasons) as i32,
            city: cities.decode(city_code)?.to_string(),
        })
    }
}

/// Integer median; even counts average the middle pair and truncate
fn median(values: &[i64]) -> i64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n == 0 {
        return 0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, month: u32, year: i32, city_code: u32) -> FeatureVector {
        FeatureVector {
            team1_code: 0,
            team2_code: 1,
            toss_winner_code: 0,
            toss_decision_code: 0,
            city_code,
            venue_code: 0,
            match_day: day,
            match_month: month,
            match_year: year,
            season: year,
        }
    }

    #[test]
    fn test_date_parts() {
        let date = NaiveDate::from_ymd_opt(2017, 4, 5).unwrap();
        assert_eq!(
            DateParts::from_date(date),
            DateParts {
                day: 5,
                month: 4,
                year: 2017
            }
        );
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3, 1, 2]), 2);
        assert_eq!(median(&[4, 1, 2, 3]), 2);
        assert_eq!(median(&[2008, 2009]), 2008);
        assert_eq!(median(&[]), 0);
    }

    #[test]
    fn test_defaults_from_rows() {
        let cities = CategoricalEncoder::fit("city", [Some("Chennai"), Some("Mumbai")]).unwrap();
        let rows = vec![
            row(10, 4, 2010, 1),
            row(20, 5, 2012, 0),
            row(15, 4, 2011, 1),
        ];
        let defaults = InferenceDefaults::from_rows(&rows, &cities).unwrap();

        assert_eq!(defaults.match_day, 15);
        assert_eq!(defaults.match_month, 4);
        assert_eq!(defaults.match_year, 2011);
        assert_eq!(defaults.season, 2011);
        assert_eq!(defaults.city, "Mumbai");
    }

    #[test]
    fn test_city_tie_prefers_first_value() {
        let cities = CategoricalEncoder::fit("city", [Some("Chennai"), Some("Mumbai")]).unwrap();
        let rows = vec![row(1, 4, 2010, 1), row(1, 4, 2010, 0)];
        let defaults = InferenceDefaults::from_rows(&rows, &cities).unwrap();

        assert_eq!(defaults.city, "Chennai");
    }
}
