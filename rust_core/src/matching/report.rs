//! Match records for idempotent storage, and statistics over stored records.

use super::{MatchResult, MatchType, HIGH_CONFIDENCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique key of a stored match; writing the same key twice overwrites
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecordKey {
    pub schedule_game_id: i64,
    pub source_type: String,
    pub source_game_id: String,
}

/// Audit record of an accepted match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub schedule_game_id: i64,
    pub source_type: String,
    pub source_game_id: String,
    /// Team names exactly as the feed sent them
    pub home_team_source: String,
    pub away_team_source: String,
    pub confidence_score: u8,
    pub match_type: MatchType,
}

impl MatchRecord {
    pub fn key(&self) -> MatchRecordKey {
        MatchRecordKey {
            schedule_game_id: self.schedule_game_id,
            source_type: self.source_type.clone(),
            source_game_id: self.source_game_id.clone(),
        }
    }
}

/// Turn accepted matches into storage records tagged with `source_tag`
pub fn to_storage_records(matches: &[MatchResult], source_tag: &str) -> Vec<MatchRecord> {
    matches
        .iter()
        .map(|m| MatchRecord {
            schedule_game_id: m.schedule_game.id,
            source_type: source_tag.to_string(),
            source_game_id: m.external_game.id.clone(),
            home_team_source: m.external_game.home_team.clone(),
            away_team_source: m.external_game.away_team.clone(),
            confidence_score: m.confidence,
            match_type: m.match_type,
        })
        .collect()
}

/// Aggregate view over stored match records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatistics {
    pub total_records: u64,
    pub by_source: BTreeMap<String, u64>,
    /// 0.0 when there are no records
    pub mean_confidence: f64,
    pub high_confidence_records: u64,
}

impl MatchStatistics {
    pub fn from_records<'r>(records: impl IntoIterator<Item = &'r MatchRecord>) -> Self {
        let mut stats = Self::default();
        let mut confidence_sum = 0u64;

        for record in records {
            stats.total_records += 1;
            *stats.by_source.entry(record.source_type.clone()).or_default() += 1;
            confidence_sum += record.confidence_score as u64;
            if record.confidence_score >= HIGH_CONFIDENCE {
                stats.high_confidence_records += 1;
            }
        }

        if stats.total_records > 0 {
            stats.mean_confidence = confidence_sum as f64 / stats.total_records as f64;
        }
        stats
    }

    /// Combine per-source aggregates (count, mean, high-confidence count)
    /// into overall statistics
    pub fn from_source_totals(
        rows: impl IntoIterator<Item = (String, u64, f64, u64)>,
    ) -> Self {
        let mut stats = Self::default();
        let mut weighted_sum = 0.0;

        for (source, count, mean, high) in rows {
            stats.total_records += count;
            stats.high_confidence_records += high;
            weighted_sum += mean * count as f64;
            *stats.by_source.entry(source).or_default() += count;
        }

        if stats.total_records > 0 {
            stats.mean_confidence = weighted_sum / stats.total_records as f64;
        }
        stats
    }
}
