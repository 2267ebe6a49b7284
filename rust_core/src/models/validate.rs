//! Input validation for externally-sourced game lists.
//!
//! The matcher assumes well-formed games, so everything coming off the wire
//! passes through here first. A payload that is not a list at all rejects the
//! whole batch; individual malformed entries are dropped and reported.

use super::ExternalGame;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// The batch as a whole could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON array of games, got {0}")]
    NotAList(&'static str),
}

/// A single entry was rejected; the rest of the batch continues
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
    #[error("invalid commence time `{0}`")]
    InvalidCommenceTime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: EntryError,
}

#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub games: Vec<ExternalGame>,
    pub rejected: Vec<RejectedEntry>,
}

/// Validate a JSON payload of external games.
///
/// Field names are accepted in camelCase (`homeTeam`) or snake_case
/// (`home_team`, as The Odds API sends them). `default_source` fills in a
/// missing `source` tag.
pub fn parse_external_games(
    value: &Value,
    default_source: &str,
) -> Result<ValidatedBatch, ValidationError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ValidationError::NotAList(json_kind(value)))?;

    let mut batch = ValidatedBatch::default();
    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry, default_source) {
            Ok(game) => batch.games.push(game),
            Err(reason) => {
                warn!("Rejected external game at index {}: {}", index, reason);
                batch.rejected.push(RejectedEntry { index, reason });
            }
        }
    }

    Ok(batch)
}

fn parse_entry(entry: &Value, default_source: &str) -> Result<ExternalGame, EntryError> {
    if !entry.is_object() {
        return Err(EntryError::NotAnObject);
    }

    let id = string_field(entry, &["id"]).ok_or(EntryError::MissingField("id"))?;
    let home_team = string_field(entry, &["homeTeam", "home_team"])
        .ok_or(EntryError::MissingField("homeTeam"))?;
    let away_team = string_field(entry, &["awayTeam", "away_team"])
        .ok_or(EntryError::MissingField("awayTeam"))?;
    let raw_time = string_field(entry, &["commenceTime", "commence_time"])
        .ok_or(EntryError::MissingField("commenceTime"))?;
    let commence_time = DateTime::parse_from_rfc3339(&raw_time)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| EntryError::InvalidCommenceTime(raw_time.clone()))?;

    let source = string_field(entry, &["source"]).unwrap_or_else(|| default_source.to_string());
    let sport = string_field(entry, &["sport", "sport_key"]);

    Ok(ExternalGame {
        id,
        home_team,
        away_team,
        commence_time,
        sport,
        source,
    })
}

/// First non-empty string found under any of `keys`, trimmed
fn string_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
