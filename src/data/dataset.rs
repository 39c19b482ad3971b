//! Labelled numeric rows derived from match records
//!
//! Records that cannot be fully derived (blank required column, value
//! outside a fitted domain, no winner) are dropped and tallied.

use std::collections::BTreeMap;
use std::fmt;

use crate::features::{EncoderRegistry, FeatureDeriver, FeatureVector};
use crate::{CricketError, MatchRecord, Result};

/// Feature rows with their encoded winners
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelledRows {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u32>,
}

impl LabelledRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        LabelledRows {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Count of dropped records per reason
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropCounts {
    counts: BTreeMap<String, usize>,
}

impl DropCounts {
    fn record(&mut self, reason: String) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Drops attributed to a reason, e.g. "missing match_date"
    pub fn get(&self, reason: &str) -> usize {
        self.counts.get(reason).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for DropCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(reason, n)| format!("{}: {}", reason, n))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Result of deriving rows from a record collection
#[derive(Debug, Clone)]
pub struct DerivedDataset {
    pub features: Vec<FeatureVector>,
    pub rows: LabelledRows,
    pub dropped: DropCounts,
}

impl DerivedDataset {
    /// Derive rows in `feature_names` order through `registry`
    pub fn build<S: AsRef<str>>(
        records: &[MatchRecord],
        registry: &EncoderRegistry,
        feature_names: &[S],
    ) -> Result<Self> {
        let deriver = FeatureDeriver::new(registry);
        let mut features = Vec::with_capacity(records.len());
        let mut rows = LabelledRows::default();
        let mut dropped = DropCounts::default();

        for record in records {
            let derived = deriver
                .derive(record)
                .and_then(|fv| deriver.target(record).map(|label| (fv, label)));

            match derived {
                Ok((fv, label)) => {
                    rows.rows.push(fv.to_row(feature_names)?);
                    rows.labels.push(label);
                    features.push(fv);
                }
                Err(CricketError::MissingFeature(name)) => {
                    dropped.record(format!("missing {}", name));
                }
                Err(CricketError::UnknownCategory { domain, .. }) => {
                    dropped.record(format!("unknown {}", domain));
                }
                Err(e) => return Err(e),
            }
        }

        if dropped.total() > 0 {
            log::info!(
                "Dropped {} of {} records ({})",
                dropped.total(),
                records.len(),
                dropped
            );
        }

        Ok(DerivedDataset {
            features,
            rows,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_NAMES;
    use crate::TossDecision;
    use chrono::NaiveDate;

    fn record(winner: Option<&str>, date: Option<NaiveDate>) -> MatchRecord {
        MatchRecord {
            team1: "A".to_string(),
            team2: "B".to_string(),
            toss_winner: Some("A".to_string()),
            toss_decision: Some(TossDecision::Bat),
            venue: Some("Ground".to_string()),
            city: Some("Town".to_string()),
            date,
            season: None,
            winner: winner.map(str::to_string),
        }
    }

    #[test]
    fn test_drops_are_counted_by_reason() {
        let date = NaiveDate::from_ymd_opt(2012, 4, 1);
        let mut outsider = record(Some("A"), date);
        outsider.toss_winner = Some("C".to_string());
        let records = vec![
            record(Some("A"), date),
            record(Some("B"), None),
            record(None, date),
            outsider,
        ];
        let registry = EncoderRegistry::fit(&records).unwrap();
        let ds = DerivedDataset::build(&records, &registry, &FEATURE_NAMES).unwrap();

        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.features.len(), 1);
        assert_eq!(ds.dropped.total(), 3);
        assert_eq!(ds.dropped.get("missing match_date"), 1);
        assert_eq!(ds.dropped.get("missing winner"), 1);
        assert_eq!(ds.dropped.get("unknown team"), 1);
    }

    #[test]
    fn test_select_keeps_pairs() {
        let rows = LabelledRows {
            rows: vec![vec![0.0], vec![1.0], vec![2.0]],
            labels: vec![10, 11, 12],
        };
        let picked = rows.select(&[2, 0]);

        assert_eq!(picked.rows, vec![vec![2.0], vec![0.0]]);
        assert_eq!(picked.labels, vec![12, 10]);
    }
}
