//! CSV loading for historical match data
//!
//! Expects a header row with at least team1, team2, toss_winner,
//! toss_decision, venue, city, date and winner. A season column is used when
//! present; other columns are ignored.

use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::{CricketError, MatchRecord, Result, TossDecision};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// One CSV row before validation
#[derive(Debug, Deserialize)]
struct RawMatch {
    team1: Option<String>,
    team2: Option<String>,
    toss_winner: Option<String>,
    toss_decision: Option<String>,
    venue: Option<String>,
    city: Option<String>,
    date: Option<String>,
    #[serde(default)]
    season: Option<String>,
    winner: Option<String>,
}

/// Load match records from a CSV file
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<Vec<MatchRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        CricketError::Parse(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let records = read_matches(std::io::BufReader::new(file))?;
    log::info!("Loaded {} matches from {}", records.len(), path.display());
    Ok(records)
}

/// Read match records from any CSV source
pub fn read_matches<R: Read>(reader: R) -> Result<Vec<MatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (i, row) in rdr.deserialize::<RawMatch>().enumerate() {
        // Header is line 1
        let line = i + 2;
        records.push(to_record(row?, line)?);
    }

    Ok(records)
}

fn to_record(raw: RawMatch, line: usize) -> Result<MatchRecord> {
    let team1 = non_blank(raw.team1)
        .ok_or_else(|| CricketError::Parse(format!("line {}: team1 is empty", line)))?;
    let team2 = non_blank(raw.team2)
        .ok_or_else(|| CricketError::Parse(format!("line {}: team2 is empty", line)))?;

    let toss_decision = non_blank(raw.toss_decision)
        .map(|s| {
            s.parse::<TossDecision>()
                .map_err(|e| CricketError::Parse(format!("line {}: {}", line, e)))
        })
        .transpose()?;

    let date = non_blank(raw.date)
        .map(|s| {
            parse_date(&s)
                .ok_or_else(|| CricketError::Parse(format!("line {}: invalid date '{}'", line, s)))
        })
        .transpose()?;

    let season = non_blank(raw.season)
        .map(|s| parse_season(&s).ok_or_else(|| {
            CricketError::Parse(format!("line {}: invalid season '{}'", line, s))
        }))
        .transpose()?;

    Ok(MatchRecord {
        team1,
        team2,
        toss_winner: non_blank(raw.toss_winner),
        toss_decision,
        venue: non_blank(raw.venue),
        city: non_blank(raw.city),
        date,
        season,
        winner: non_blank(raw.winner),
    })
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse a match date in any of the accepted formats
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

/// Seasons are years, sometimes written "2007/08"; the first year is used
fn parse_season(s: &str) -> Option<i32> {
    s.split('/').next().and_then(|y| y.trim().parse().ok())
}
