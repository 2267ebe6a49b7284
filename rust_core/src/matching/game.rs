//! Batch game matcher.
//!
//! Pure and synchronous: no I/O, no clock, no shared state. Each external
//! game is resolved independently, so a schedule game may be claimed by
//! more than one external game (duplicate feed listings both match).

use super::scoring::score_candidate;
use super::team::TeamNormalizer;
use super::{
    MatchOptions, MatchResult, MatchType, MatchingSummary, UnmatchedReason,
};
use crate::models::{ExternalGame, ScheduleGame};
use tracing::{debug, info, warn};

/// Suggestions below this similarity are not worth printing
const SUGGESTION_MIN_SIMILARITY: f64 = 0.8;

/// Best-scoring candidate for one external game
struct Candidate<'s> {
    game: &'s ScheduleGame,
    raw: u32,
    reasons: Vec<String>,
}

/// Matches externally-sourced games against a schedule snapshot
#[derive(Debug, Clone)]
pub struct GameMatcher<'a> {
    normalizer: &'a TeamNormalizer,
    options: MatchOptions,
}

impl GameMatcher<'static> {
    /// Matcher over the NFL team tables
    pub fn nfl(options: MatchOptions) -> Self {
        Self::new(TeamNormalizer::nfl(), options)
    }
}

impl<'a> GameMatcher<'a> {
    pub fn new(normalizer: &'a TeamNormalizer, options: MatchOptions) -> Self {
        Self {
            normalizer,
            options,
        }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Match every external game against the schedule snapshot.
    ///
    /// Every input game lands in exactly one of `matches` or
    /// `unmatched_external_games`, in input order.
    pub fn match_games(
        &self,
        external_games: &[ExternalGame],
        schedule: &[ScheduleGame],
    ) -> MatchingSummary {
        let mut summary = MatchingSummary::default();

        for external in external_games {
            match self.match_one(external, schedule) {
                Ok(result) => {
                    debug!(
                        "Matched {} ({} @ {}) -> game {} [{}% {}]",
                        external.id,
                        external.away_team,
                        external.home_team,
                        result.schedule_game.id,
                        result.confidence,
                        result.match_type.as_str()
                    );
                    summary.record_match(result);
                }
                Err(reason) => summary.record_unmatched(external.clone(), reason),
            }
        }

        info!(
            "Matching complete: {}/{} matched ({} high confidence), {} unmatched ({} naming failures)",
            summary.matched_games,
            summary.total_external_games,
            summary.high_confidence_matches,
            summary.unmatched_games,
            summary.naming_failures()
        );

        summary
    }

    /// Match a single external game
    pub fn match_one(
        &self,
        external: &ExternalGame,
        schedule: &[ScheduleGame],
    ) -> Result<MatchResult, UnmatchedReason> {
        let home_code = self.resolve_team(external, &external.home_team)?;
        let away_code = self.resolve_team(external, &external.away_team)?;

        let best = self
            .best_candidate(home_code, away_code, external, schedule)
            .ok_or_else(|| {
                debug!(
                    "No schedule game within {}h of {} ({} @ {})",
                    self.options.time_tolerance_hours,
                    external.id,
                    external.away_team,
                    external.home_team
                );
                UnmatchedReason::NoCandidate
            })?;

        let confidence = super::confidence_from_raw(best.raw);
        if confidence < self.options.confidence_threshold {
            debug!(
                "Best candidate for {} is game {} at {}% (threshold {}%)",
                external.id, best.game.id, confidence, self.options.confidence_threshold
            );
            return Err(UnmatchedReason::BelowThreshold {
                schedule_game_id: best.game.id,
                confidence,
            });
        }

        Ok(MatchResult {
            schedule_game: best.game.clone(),
            external_game: external.clone(),
            confidence,
            match_type: MatchType::from_confidence(confidence),
            match_reasons: best.reasons,
        })
    }

    fn resolve_team(&self, external: &ExternalGame, name: &str) -> Result<&'a str, UnmatchedReason> {
        if let Some(code) = self.normalizer.normalize(name) {
            return Ok(code);
        }

        let suggestion = self
            .normalizer
            .closest_canonical(name)
            .filter(|(_, similarity)| *similarity >= SUGGESTION_MIN_SIMILARITY)
            .map(|(canonical, _)| canonical.to_string());

        warn!(
            "Unknown team name '{}' in external game {} (closest: {})",
            name,
            external.id,
            suggestion.as_deref().unwrap_or("none")
        );

        Err(UnmatchedReason::UnknownTeam {
            team_name: name.to_string(),
            suggestion,
        })
    }

    /// Highest-scoring candidate within the time window.
    ///
    /// Ties go to the lowest schedule game id so the result does not depend
    /// on the order the snapshot was read in.
    fn best_candidate<'s>(
        &self,
        home_code: &str,
        away_code: &str,
        external: &ExternalGame,
        schedule: &'s [ScheduleGame],
    ) -> Option<Candidate<'s>> {
        let mut best: Option<Candidate<'s>> = None;

        for game in schedule {
            let Some(score) =
                score_candidate(home_code, away_code, external.commence_time, game, &self.options)
            else {
                continue;
            };
            if score.raw == 0 {
                continue;
            }

            let better = match &best {
                None => true,
                Some(current) => {
                    score.raw > current.raw || (score.raw == current.raw && game.id < current.game.id)
                }
            };
            if better {
                best = Some(Candidate {
                    game,
                    raw: score.raw,
                    reasons: score.reasons,
                });
            }
        }

        best
    }
}

/// Match with the NFL tables and the given options
pub fn match_games(
    external_games: &[ExternalGame],
    schedule: &[ScheduleGame],
    options: &MatchOptions,
) -> MatchingSummary {
    GameMatcher::nfl(*options).match_games(external_games, schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 20, 17, 0, 0).unwrap()
    }

    fn schedule_game(id: i64, home: &str, away: &str, start: DateTime<Utc>) -> ScheduleGame {
        ScheduleGame {
            id,
            external_schedule_id: format!("espn-{}", id),
            home_team_code: home.to_string(),
            away_team_code: away.to_string(),
            start_time: start,
            week: 7,
            status: GameStatus::Scheduled,
        }
    }

    fn external(id: &str, home: &str, away: &str, time: DateTime<Utc>) -> ExternalGame {
        ExternalGame::new(id, home, away, time, "odds_api")
    }

    #[test]
    fn test_picks_highest_score() {
        let schedule = vec![
            schedule_game(1, "KC", "BUF", kickoff() + Duration::hours(5)),
            schedule_game(2, "KC", "BUF", kickoff()),
        ];
        let ext = external("e1", "Kansas City Chiefs", "Buffalo Bills", kickoff());

        let result = GameMatcher::nfl(MatchOptions::default())
            .match_one(&ext, &schedule)
            .unwrap();
        assert_eq!(result.schedule_game.id, 2);
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_tie_goes_to_lowest_id() {
        let schedule = vec![
            schedule_game(9, "KC", "BUF", kickoff()),
            schedule_game(4, "KC", "BUF", kickoff()),
            schedule_game(7, "KC", "BUF", kickoff()),
        ];
        let ext = external("e1", "Kansas City Chiefs", "Buffalo Bills", kickoff());
        let matcher = GameMatcher::nfl(MatchOptions::default());

        assert_eq!(matcher.match_one(&ext, &schedule).unwrap().schedule_game.id, 4);

        let mut reversed = schedule.clone();
        reversed.reverse();
        assert_eq!(matcher.match_one(&ext, &reversed).unwrap().schedule_game.id, 4);
    }

    #[test]
    fn test_unknown_team_short_circuits() {
        let schedule = vec![schedule_game(1, "KC", "BUF", kickoff())];
        let ext = external("e1", "Springfield Isotopes", "Buffalo Bills", kickoff());

        let reason = GameMatcher::nfl(MatchOptions::default())
            .match_one(&ext, &schedule)
            .unwrap_err();
        assert!(reason.is_naming_failure());
    }

    #[test]
    fn test_misspelling_gets_suggestion() {
        let ext = external("e1", "Kansas City Chefs", "Buffalo Bills", kickoff());
        let reason = GameMatcher::nfl(MatchOptions::default())
            .match_one(&ext, &[])
            .unwrap_err();
        match reason {
            UnmatchedReason::UnknownTeam { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("kansas city chiefs"));
            }
            other => panic!("unexpected reason {:?}", other),
        }
    }

    #[test]
    fn test_empty_schedule_leaves_everything_unmatched() {
        let games = vec![
            external("e1", "Kansas City Chiefs", "Buffalo Bills", kickoff()),
            external("e2", "Detroit Lions", "Dallas Cowboys", kickoff()),
        ];
        let summary = match_games(&games, &[], &MatchOptions::default());

        assert_eq!(summary.total_external_games, 2);
        assert_eq!(summary.unmatched_games, 2);
        assert!(summary
            .diagnostics
            .iter()
            .all(|d| d.reason == UnmatchedReason::NoCandidate));
    }

    #[test]
    fn test_below_threshold_reports_best_candidate() {
        let schedule = vec![schedule_game(3, "KC", "BUF", kickoff() + Duration::hours(5))];
        let ext = external("e1", "Kansas City Chiefs", "Buffalo Bills", kickoff());
        let options = MatchOptions::default().with_confidence_threshold(90);

        let reason = GameMatcher::nfl(options).match_one(&ext, &schedule).unwrap_err();
        assert_eq!(
            reason,
            UnmatchedReason::BelowThreshold {
                schedule_game_id: 3,
                confidence: 78
            }
        );
    }

    #[test]
    fn test_low_threshold_keeps_manual_review_label() {
        let schedule = vec![schedule_game(5, "DAL", "NYG", kickoff())];
        let ext = external("e1", "Kansas City Chiefs", "Buffalo Bills", kickoff());
        let options = MatchOptions::default().with_confidence_threshold(0);

        let result = GameMatcher::nfl(options).match_one(&ext, &schedule).unwrap();
        assert_eq!(result.confidence, 44);
        assert_eq!(result.match_type, MatchType::ManualReview);
    }
}
