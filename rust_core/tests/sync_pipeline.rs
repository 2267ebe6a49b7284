//! Sync pipeline over a captured Odds API payload and in-memory stores.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parlay_core::clients::odds_api::parse_feed;
use parlay_core::clients::{FeedBatch, OddsSource, ODDS_API_SOURCE};
use parlay_core::db::{InMemoryLineStore, InMemoryMatchStore, StaticSchedule};
use parlay_core::matching::{MatchOptions, MatchRecordKey, MatchType};
use parlay_core::models::{GameStatus, ScheduleGame};
use parlay_core::sync::{run_sync, SyncContext, SyncRequest};
use serde_json::{json, Value};

/// Replays a fixed payload through the real feed parser
struct CapturedFeed(Value);

#[async_trait]
impl OddsSource for CapturedFeed {
    fn source_tag(&self) -> &str {
        ODDS_API_SOURCE
    }

    async fn fetch_games(&self) -> Result<FeedBatch> {
        parse_feed(&self.0)
    }
}

fn payload() -> Value {
    json!([
        {
            "id": "evt-kc-buf",
            "commence_time": "2024-10-20T20:25:00Z",
            "home_team": "Kansas City Chiefs",
            "away_team": "Buffalo Bills",
            "bookmakers": [{
                "key": "fanduel",
                "last_update": "2024-10-19T12:00:00Z",
                "markets": [{"key": "h2h", "outcomes": [
                    {"name": "Kansas City Chiefs", "price": -125},
                    {"name": "Buffalo Bills", "price": 105}
                ]}]
            }]
        },
        {
            "id": "evt-lv-den",
            "commence_time": "2024-10-20T22:05:00Z",
            "home_team": "Oakland Raiders",
            "away_team": "Denver Broncos",
            "bookmakers": []
        },
        {
            "id": "evt-isotopes",
            "commence_time": "2024-10-20T17:00:00Z",
            "home_team": "Springfield Isotopes",
            "away_team": "Shelbyville Sharks"
        },
        {
            "id": "evt-broken",
            "home_team": "Detroit Lions"
        }
    ])
}

fn schedule() -> StaticSchedule {
    let game = |id: i64, home: &str, away: &str, hour: u32, minute: u32| ScheduleGame {
        id,
        external_schedule_id: format!("4016718{:02}", id),
        home_team_code: home.to_string(),
        away_team_code: away.to_string(),
        start_time: Utc.with_ymd_and_hms(2024, 10, 20, hour, minute, 0).unwrap(),
        week: 7,
        status: GameStatus::Scheduled,
    };
    StaticSchedule::new(vec![
        game(12, "LV", "DEN", 22, 5),
        game(11, "KC", "BUF", 20, 25),
        game(13, "DET", "MIN", 17, 0),
    ])
}

#[tokio::test]
async fn test_captured_feed_end_to_end() {
    let odds = CapturedFeed(payload());
    let schedule = schedule();
    let matches = InMemoryMatchStore::new();
    let lines = InMemoryLineStore::new();
    let ctx = SyncContext {
        odds: &odds,
        schedule: &schedule,
        matches: &matches,
        lines: &lines,
    };
    let request = SyncRequest {
        season_id: 2024,
        options: MatchOptions::default(),
    };

    let report = run_sync(&ctx, &request).await.unwrap();

    assert_eq!(report.rejected_entries, 1);
    assert_eq!(report.summary.total_external_games, 3);
    assert_eq!(report.summary.matched_games, 2);
    assert_eq!(report.summary.naming_failures(), 1);
    assert_eq!(report.records_persisted, 2);
    assert_eq!(report.lines_attached, 1);
    assert!(report.fully_persisted());

    let kc = matches
        .get(&MatchRecordKey {
            schedule_game_id: 11,
            source_type: ODDS_API_SOURCE.to_string(),
            source_game_id: "evt-kc-buf".to_string(),
        })
        .unwrap();
    assert_eq!(kc.confidence_score, 100);
    assert_eq!(kc.match_type, MatchType::Exact);
    assert_eq!(kc.home_team_source, "Kansas City Chiefs");

    let fanduel = lines.get(11, "fanduel").unwrap();
    assert_eq!(fanduel.home_moneyline, Some(-125.0));
    assert!(lines.get(12, "fanduel").is_none());

    let stats = report.statistics.unwrap();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.by_source.get(ODDS_API_SOURCE), Some(&2));
    assert_eq!(stats.high_confidence_records, 2);
}

#[tokio::test]
async fn test_non_list_payload_aborts_run() {
    let odds = CapturedFeed(json!({"message": "Usage quota has been reached"}));
    let schedule = schedule();
    let matches = InMemoryMatchStore::new();
    let lines = InMemoryLineStore::new();
    let ctx = SyncContext {
        odds: &odds,
        schedule: &schedule,
        matches: &matches,
        lines: &lines,
    };
    let request = SyncRequest {
        season_id: 2024,
        options: MatchOptions::default(),
    };

    assert!(run_sync(&ctx, &request).await.is_err());
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_report_json_shape() {
    let odds = CapturedFeed(payload());
    let schedule = schedule();
    let matches = InMemoryMatchStore::new();
    let lines = InMemoryLineStore::new();
    let ctx = SyncContext {
        odds: &odds,
        schedule: &schedule,
        matches: &matches,
        lines: &lines,
    };
    let request = SyncRequest {
        season_id: 2024,
        options: MatchOptions::default(),
    };

    let report = run_sync(&ctx, &request).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["source"], ODDS_API_SOURCE);
    assert_eq!(json["summary"]["matchedGames"], 2);
    assert_eq!(json["summary"]["matches"][0]["matchType"], "exact");
    assert_eq!(json["summary"]["diagnostics"][0]["reason"]["kind"], "unknownTeam");
}
