//! Categorical encoders for teams, cities and venues
//!
//! Every categorical domain gets a dense integer code per distinct value,
//! assigned by rank in sorted order. One registry is fitted per training run
//! and travels with the model; it is never refitted at inference time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{CricketError, MatchRecord, Result};

/// Domain names used in errors and reports
pub const TEAM_DOMAIN: &str = "team";
pub const CITY_DOMAIN: &str = "city";
pub const VENUE_DOMAIN: &str = "venue";

/// Bidirectional value <-> code mapping for one categorical domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EncoderParts", into = "EncoderParts")]
pub struct CategoricalEncoder {
    domain: String,
    /// Sorted distinct values; the index is the code
    values: Vec<String>,
    index: HashMap<String, u32>,
}

/// Persisted form of an encoder; the reverse index is rebuilt on load
#[derive(Serialize, Deserialize)]
pub struct EncoderParts {
    domain: String,
    values: Vec<String>,
}

impl CategoricalEncoder {
    /// Fit an encoder over the non-missing values of a column
    pub fn fit<I, S>(domain: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .flatten()
            .map(|v| v.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(CricketError::EmptyDomain {
                domain: domain.to_string(),
            });
        }

        Ok(Self::from_sorted(domain, distinct.into_iter().collect()))
    }

    fn from_sorted(domain: &str, values: Vec<String>) -> Self {
        let index = values
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code as u32))
            .collect();

        CategoricalEncoder {
            domain: domain.to_string(),
            values,
            index,
        }
    }

    /// Code for a value seen during fitting
    pub fn encode(&self, value: &str) -> Result<u32> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| CricketError::UnknownCategory {
                domain: self.domain.clone(),
                value: value.to_string(),
            })
    }

    /// Value for a code in `[0, len)`
    pub fn decode(&self, code: u32) -> Result<&str> {
        self.values
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| CricketError::InvalidCode {
                domain: self.domain.clone(),
                code,
                size: self.values.len(),
            })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Values in code order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TryFrom<EncoderParts> for CategoricalEncoder {
    type Error = CricketError;

    fn try_from(parts: EncoderParts) -> Result<Self> {
        if parts.values.is_empty() {
            return Err(CricketError::EmptyDomain {
                domain: parts.domain,
            });
        }
        if parts.values.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CricketError::ArtifactMismatch(format!(
                "encoder '{}' values are not sorted and distinct",
                parts.domain
            )));
        }
        Ok(Self::from_sorted(&parts.domain, parts.values))
    }
}

impl From<CategoricalEncoder> for EncoderParts {
    fn from(encoder: CategoricalEncoder) -> Self {
        EncoderParts {
            domain: encoder.domain,
            values: encoder.values,
        }
    }
}

/// All categorical encoders used by the model
///
/// The team encoder is shared by team1, team2, toss winner and the winner
/// target, so a team maps to the same code whichever column it appears in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    teams: CategoricalEncoder,
    cities: CategoricalEncoder,
    venues: CategoricalEncoder,
}

impl EncoderRegistry {
    /// Fit every domain over the full record collection
    pub fn fit(records: &[MatchRecord]) -> Result<Self> {
        let teams = CategoricalEncoder::fit(
            TEAM_DOMAIN,
            records
                .iter()
                .flat_map(|m| [Some(m.team1.as_str()), Some(m.team2.as_str())]),
        )?;
        let cities = CategoricalEncoder::fit(CITY_DOMAIN, records.iter().map(|m| m.city.as_deref()))?;
        let venues =
            CategoricalEncoder::fit(VENUE_DOMAIN, records.iter().map(|m| m.venue.as_deref()))?;

        log::debug!(
            "Fitted encoders: {} teams, {} cities, {} venues",
            teams.len(),
            cities.len(),
            venues.len()
        );

        Ok(EncoderRegistry {
            teams,
            cities,
            venues,
        })
    }

    pub fn teams(&self) -> &CategoricalEncoder {
        &self.teams
    }

    pub fn cities(&self) -> &CategoricalEncoder {
        &self.cities
    }

    pub fn venues(&self) -> &CategoricalEncoder {
        &self.venues
    }

    /// Encoders in a fixed order
    pub fn encoders(&self) -> [&CategoricalEncoder; 3] {
        [&self.teams, &self.cities, &self.venues]
    }
}
