//! Odds-to-Schedule Game Matching
//!
//! Links games from a betting-odds feed to games in the schedule store.
//! The two sources share no identifiers and spell team names differently,
//! so each external game is scored against every schedule game on team-code
//! agreement and kickoff proximity, and the best candidate above a
//! confidence floor wins.
//!
//! - `team`: free-text team name -> canonical code
//! - `scoring`: signal weights and per-candidate scoring
//! - `game`: batch matcher producing a `MatchingSummary`
//! - `report`: storage records and aggregate statistics

use crate::models::{ExternalGame, ScheduleGame};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub mod game;
pub mod report;
pub mod scoring;
pub mod team;

pub use game::{match_games, GameMatcher};
pub use report::{to_storage_records, MatchRecord, MatchRecordKey, MatchStatistics};
pub use scoring::{confidence_from_raw, CandidateScore, MAX_RAW_SCORE};
pub use team::{normalize_team_name, Resolution, ResolutionTier, TeamNormalizer};

/// Confidence at or above which a match counts as high confidence
pub const HIGH_CONFIDENCE: u8 = 95;

/// Confidence at or above which a match is at least fuzzy
pub const FUZZY_CONFIDENCE: u8 = 70;

// ============================================================================
// Options
// ============================================================================

/// Matcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    /// Minimum confidence (0-100) to accept a candidate
    pub confidence_threshold: u8,
    /// Candidates further than this from the external kickoff are never scored
    pub time_tolerance_hours: f64,
    /// Let one-sided team agreement contribute score
    pub enable_fuzzy_matching: bool,
    /// UTC offset used to decide whether two kickoffs fall on the same calendar day
    pub calendar_utc_offset_minutes: i32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 80,
            time_tolerance_hours: 6.0,
            enable_fuzzy_matching: true,
            calendar_utc_offset_minutes: 0,
        }
    }
}

impl MatchOptions {
    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_time_tolerance_hours(mut self, hours: f64) -> Self {
        self.time_tolerance_hours = hours;
        self
    }

    pub fn with_fuzzy_matching(mut self, enabled: bool) -> Self {
        self.enable_fuzzy_matching = enabled;
        self
    }

    pub fn with_calendar_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.calendar_utc_offset_minutes = minutes;
        self
    }

    /// Offset for same-day comparison; out-of-range values fall back to UTC
    pub fn calendar_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.calendar_utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

// ============================================================================
// Results
// ============================================================================

/// Coarse confidence bucket used for downstream triage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    ManualReview,
}

impl MatchType {
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            MatchType::Exact
        } else if confidence >= FUZZY_CONFIDENCE {
            MatchType::Fuzzy
        } else {
            MatchType::ManualReview
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
            MatchType::ManualReview => "manual-review",
        }
    }
}

/// An accepted link between one schedule game and one external game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub schedule_game: ScheduleGame,
    pub external_game: ExternalGame,
    /// 0-100
    pub confidence: u8,
    pub match_type: MatchType,
    pub match_reasons: Vec<String>,
}

/// Why an external game ended up unmatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UnmatchedReason {
    /// A team name could not be normalized
    #[serde(rename_all = "camelCase")]
    UnknownTeam {
        team_name: String,
        suggestion: Option<String>,
    },
    /// No schedule game within the time window
    NoCandidate,
    /// Best candidate did not clear the confidence threshold
    #[serde(rename_all = "camelCase")]
    BelowThreshold {
        schedule_game_id: i64,
        confidence: u8,
    },
}

impl UnmatchedReason {
    pub fn is_naming_failure(&self) -> bool {
        matches!(self, UnmatchedReason::UnknownTeam { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDiagnostic {
    pub external_game_id: String,
    pub reason: UnmatchedReason,
}

/// Outcome of one matching batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingSummary {
    pub total_external_games: usize,
    pub matched_games: usize,
    pub unmatched_games: usize,
    pub high_confidence_matches: usize,
    pub low_confidence_matches: usize,
    pub matches: Vec<MatchResult>,
    pub unmatched_external_games: Vec<ExternalGame>,
    /// One entry per unmatched game, in the same order
    pub diagnostics: Vec<MatchDiagnostic>,
}

impl MatchingSummary {
    pub(crate) fn record_match(&mut self, result: MatchResult) {
        self.total_external_games += 1;
        self.matched_games += 1;
        if result.confidence >= HIGH_CONFIDENCE {
            self.high_confidence_matches += 1;
        } else {
            self.low_confidence_matches += 1;
        }
        self.matches.push(result);
    }

    pub(crate) fn record_unmatched(&mut self, game: ExternalGame, reason: UnmatchedReason) {
        self.total_external_games += 1;
        self.unmatched_games += 1;
        self.diagnostics.push(MatchDiagnostic {
            external_game_id: game.id.clone(),
            reason,
        });
        self.unmatched_external_games.push(game);
    }

    /// Unmatched games whose team names could not be normalized
    pub fn naming_failures(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.reason.is_naming_failure())
            .count()
    }

    /// Share of external games that matched, 0.0 for an empty batch
    pub fn match_rate(&self) -> f64 {
        if self.total_external_games == 0 {
            return 0.0;
        }
        self.matched_games as f64 / self.total_external_games as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = MatchOptions::default();
        assert_eq!(options.confidence_threshold, 80);
        assert_eq!(options.time_tolerance_hours, 6.0);
        assert!(options.enable_fuzzy_matching);
        assert_eq!(options.calendar_offset(), Utc.fix());
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: MatchOptions =
            serde_json::from_str(r#"{"confidenceThreshold": 90}"#).unwrap();
        assert_eq!(options.confidence_threshold, 90);
        assert_eq!(options.time_tolerance_hours, 6.0);
    }

    #[test]
    fn test_invalid_calendar_offset_falls_back_to_utc() {
        let options = MatchOptions::default().with_calendar_utc_offset_minutes(100_000);
        assert_eq!(options.calendar_offset(), Utc.fix());

        let eastern = MatchOptions::default().with_calendar_utc_offset_minutes(-300);
        assert_eq!(eastern.calendar_offset().local_minus_utc(), -18_000);
    }

    #[test]
    fn test_match_type_thresholds() {
        assert_eq!(MatchType::from_confidence(100), MatchType::Exact);
        assert_eq!(MatchType::from_confidence(95), MatchType::Exact);
        assert_eq!(MatchType::from_confidence(94), MatchType::Fuzzy);
        assert_eq!(MatchType::from_confidence(70), MatchType::Fuzzy);
        assert_eq!(MatchType::from_confidence(69), MatchType::ManualReview);
        assert_eq!(MatchType::from_confidence(0), MatchType::ManualReview);
    }

    #[test]
    fn test_match_type_serialization() {
        assert_eq!(
            serde_json::to_string(&MatchType::ManualReview).unwrap(),
            "\"manual-review\""
        );
        assert_eq!(MatchType::Fuzzy.as_str(), "fuzzy");
    }

    #[test]
    fn test_empty_summary_rate() {
        assert_eq!(MatchingSummary::default().match_rate(), 0.0);
    }
}
