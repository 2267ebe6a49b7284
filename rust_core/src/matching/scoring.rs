//! Candidate scoring.
//!
//! A candidate's raw score is the sum of three independent dimensions:
//! team-pair agreement, kickoff proximity and same calendar day. Within a
//! dimension only the strongest signal counts.

use super::MatchOptions;
use crate::models::ScheduleGame;
use chrono::{DateTime, Utc};

// Team-pair agreement
pub const EXACT_TEAMS: u32 = 50;
pub const REVERSED_TEAMS: u32 = 40;
pub const FUZZY_TEAMS: u32 = 30;

// Kickoff proximity
pub const TIME_WITHIN_1H: u32 = 30;
pub const TIME_WITHIN_3H: u32 = 20;
pub const TIME_WITHIN_6H: u32 = 10;

pub const SAME_DAY: u32 = 10;

const fn max(a: u32, b: u32) -> u32 {
    if a > b {
        a
    } else {
        b
    }
}

/// Highest attainable raw score, derived from the weights above
pub const MAX_RAW_SCORE: u32 = max(EXACT_TEAMS, max(REVERSED_TEAMS, FUZZY_TEAMS))
    + max(TIME_WITHIN_1H, max(TIME_WITHIN_3H, TIME_WITHIN_6H))
    + SAME_DAY;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Score of one schedule game against one external game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateScore {
    pub raw: u32,
    pub reasons: Vec<String>,
}

impl CandidateScore {
    pub fn confidence(&self) -> u8 {
        confidence_from_raw(self.raw)
    }

    fn add(&mut self, points: u32, reason: &str) {
        self.raw += points;
        self.reasons.push(reason.to_string());
    }
}

/// Scale a raw score onto 0-100
pub fn confidence_from_raw(raw: u32) -> u8 {
    let scaled = (raw as f64 / MAX_RAW_SCORE as f64 * 100.0).round();
    scaled.clamp(0.0, 100.0) as u8
}

/// Absolute kickoff difference in hours
pub fn hours_apart(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (a - b).num_milliseconds().abs() as f64 / MILLIS_PER_HOUR
}

/// Score `candidate` for an external game that normalized to
/// `home_code` / `away_code` and kicks off at `kickoff`.
///
/// Returns `None` when the candidate is outside the time window; such
/// candidates are never considered, whatever the team evidence.
pub fn score_candidate(
    home_code: &str,
    away_code: &str,
    kickoff: DateTime<Utc>,
    candidate: &ScheduleGame,
    options: &MatchOptions,
) -> Option<CandidateScore> {
    let hours = hours_apart(kickoff, candidate.start_time);
    // A NaN tolerance admits nothing
    if options.time_tolerance_hours.is_nan() || hours > options.time_tolerance_hours {
        return None;
    }

    let mut score = CandidateScore {
        raw: 0,
        reasons: Vec::new(),
    };

    let cand_home = candidate.home_team_code.as_str();
    let cand_away = candidate.away_team_code.as_str();
    if cand_home == home_code && cand_away == away_code {
        score.add(EXACT_TEAMS, "Exact team match");
    } else if cand_home == away_code && cand_away == home_code {
        score.add(REVERSED_TEAMS, "Teams reversed (home/away swapped)");
    } else if options.enable_fuzzy_matching {
        let home_present = cand_home == home_code || cand_away == home_code;
        let away_present = cand_home == away_code || cand_away == away_code;
        if home_present && away_present {
            score.add(FUZZY_TEAMS, "Fuzzy team match");
        }
    }

    if hours <= 1.0 {
        score.add(TIME_WITHIN_1H, "Very close time match (±1 hour)");
    } else if hours <= 3.0 {
        score.add(TIME_WITHIN_3H, "Close time match (±3 hours)");
    } else if hours <= 6.0 {
        score.add(TIME_WITHIN_6H, "Same time window (±6 hours)");
    }

    let offset = options.calendar_offset();
    if kickoff.with_timezone(&offset).date_naive()
        == candidate.start_time.with_timezone(&offset).date_naive()
    {
        score.add(SAME_DAY, "Same day");
    }

    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use chrono::{Duration, TimeZone};

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 20, 17, 0, 0).unwrap()
    }

    fn schedule(home: &str, away: &str, start: DateTime<Utc>) -> ScheduleGame {
        ScheduleGame {
            id: 1,
            external_schedule_id: "401671789".to_string(),
            home_team_code: home.to_string(),
            away_team_code: away.to_string(),
            start_time: start,
            week: 7,
            status: GameStatus::Scheduled,
        }
    }

    #[test]
    fn test_max_score_is_derived() {
        assert_eq!(MAX_RAW_SCORE, 90);
    }

    #[test]
    fn test_confidence_scaling() {
        assert_eq!(confidence_from_raw(90), 100);
        assert_eq!(confidence_from_raw(80), 89);
        assert_eq!(confidence_from_raw(70), 78);
        assert_eq!(confidence_from_raw(0), 0);
        assert_eq!(confidence_from_raw(500), 100);
    }

    #[test]
    fn test_exact_same_instant() {
        let game = schedule("KC", "BUF", kickoff());
        let score = score_candidate("KC", "BUF", kickoff(), &game, &MatchOptions::default()).unwrap();
        assert_eq!(score.raw, 90);
        assert_eq!(
            score.reasons,
            vec!["Exact team match", "Very close time match (±1 hour)", "Same day"]
        );
    }

    #[test]
    fn test_time_bands() {
        let options = MatchOptions::default();
        let at = |h: i64| schedule("KC", "BUF", kickoff() + Duration::hours(h));

        assert_eq!(score_candidate("KC", "BUF", kickoff(), &at(1), &options).unwrap().raw, 90);
        assert_eq!(score_candidate("KC", "BUF", kickoff(), &at(2), &options).unwrap().raw, 80);
        assert_eq!(score_candidate("KC", "BUF", kickoff(), &at(5), &options).unwrap().raw, 70);
    }

    #[test]
    fn test_window_boundary_is_strict() {
        let options = MatchOptions::default();
        let edge = schedule("KC", "BUF", kickoff() + Duration::hours(6));
        assert!(score_candidate("KC", "BUF", kickoff(), &edge, &options).is_some());

        let past_edge = schedule("KC", "BUF", kickoff() + Duration::hours(6) + Duration::milliseconds(1));
        assert!(score_candidate("KC", "BUF", kickoff(), &past_edge, &options).is_none());
    }

    #[test]
    fn test_nan_tolerance_excludes_everything() {
        let options = MatchOptions::default().with_time_tolerance_hours(f64::NAN);
        let same_instant = schedule("KC", "BUF", kickoff());
        assert!(score_candidate("KC", "BUF", kickoff(), &same_instant, &options).is_none());

        let month_away = schedule("KC", "BUF", kickoff() + Duration::days(30));
        assert!(score_candidate("KC", "BUF", kickoff(), &month_away, &options).is_none());
    }

    #[test]
    fn test_reversed_teams() {
        let game = schedule("KC", "BUF", kickoff());
        let score = score_candidate("BUF", "KC", kickoff(), &game, &MatchOptions::default()).unwrap();
        assert_eq!(score.raw, 80);
        assert_eq!(score.reasons[0], "Teams reversed (home/away swapped)");
    }

    #[test]
    fn test_unrelated_teams_score_time_only() {
        let game = schedule("DAL", "NYG", kickoff());
        let score = score_candidate("KC", "BUF", kickoff(), &game, &MatchOptions::default()).unwrap();
        assert_eq!(score.raw, 40);
        assert_eq!(score.confidence(), 44);
    }

    #[test]
    fn test_fuzzy_requires_flag() {
        // Both external codes appear on the candidate, but not as a clean pair
        let game = schedule("KC", "BUF", kickoff());
        let with_fuzzy =
            score_candidate("KC", "KC", kickoff(), &game, &MatchOptions::default()).unwrap();
        assert_eq!(with_fuzzy.raw, 70);
        assert_eq!(with_fuzzy.reasons[0], "Fuzzy team match");

        let without = MatchOptions::default().with_fuzzy_matching(false);
        assert_eq!(score_candidate("KC", "KC", kickoff(), &game, &without).unwrap().raw, 40);

        // One side only is not enough
        let odd_pair = schedule("KC", "KC", kickoff());
        let fuzzy = score_candidate("KC", "XX", kickoff(), &odd_pair, &MatchOptions::default())
            .unwrap();
        assert_eq!(fuzzy.raw, 40);

        let strict = MatchOptions::default().with_fuzzy_matching(false);
        let one_sided = schedule("KC", "DEN", kickoff());
        assert_eq!(
            score_candidate("KC", "BUF", kickoff(), &one_sided, &strict).unwrap().raw,
            40
        );
    }

    #[test]
    fn test_same_day_uses_calendar_offset() {
        // 00:20 UTC Monday is 20:20 Sunday in US Eastern (UTC-4)
        let sunday_night = Utc.with_ymd_and_hms(2024, 10, 21, 0, 20, 0).unwrap();
        let earlier = sunday_night - Duration::hours(2);
        let game = schedule("KC", "BUF", earlier);

        let utc = score_candidate("KC", "BUF", sunday_night, &game, &MatchOptions::default()).unwrap();
        assert_eq!(utc.raw, 70);

        let eastern = MatchOptions::default().with_calendar_utc_offset_minutes(-240);
        let local = score_candidate("KC", "BUF", sunday_night, &game, &eastern).unwrap();
        assert_eq!(local.raw, 80);
    }
}
