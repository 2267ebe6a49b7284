//! Schedule snapshot reads.
//!
//! The season is always passed in explicitly; nothing here resolves a
//! "current" season from the clock or from a season title.

use crate::models::{GameStatus, ScheduleGame};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

/// Read access to the schedule store
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// All games of one season, ordered by game id
    async fn load_games(&self, season_id: i64) -> Result<Vec<ScheduleGame>>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ScheduleRow {
    id: i64,
    espn_game_id: String,
    home_team: String,
    away_team: String,
    start_time: DateTime<Utc>,
    week: i32,
    status: String,
}

impl From<ScheduleRow> for ScheduleGame {
    fn from(row: ScheduleRow) -> Self {
        Self {
            id: row.id,
            external_schedule_id: row.espn_game_id,
            home_team_code: row.home_team.to_uppercase(),
            away_team_code: row.away_team.to_uppercase(),
            start_time: row.start_time,
            week: row.week,
            status: GameStatus::from_status_str(&row.status),
        }
    }
}

/// Schedule store backed by the `games` and `teams` tables
#[derive(Debug, Clone)]
pub struct PgScheduleStore {
    pool: PgPool,
}

impl PgScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleSource for PgScheduleStore {
    async fn load_games(&self, season_id: i64) -> Result<Vec<ScheduleGame>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT g.id, g.espn_game_id,
                   ht.abbreviation AS home_team, at.abbreviation AS away_team,
                   g.start_time, g.week, g.status
            FROM games g
            JOIN teams ht ON ht.id = g.home_team_id
            JOIN teams at ON at.id = g.away_team_id
            WHERE g.season_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load schedule for season {}", season_id))?;

        debug!("Loaded {} schedule games for season {}", rows.len(), season_id);
        Ok(rows.into_iter().map(ScheduleGame::from).collect())
    }
}

/// Fixed schedule snapshot, for replaying a captured schedule or tests
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    games: Vec<ScheduleGame>,
}

impl StaticSchedule {
    pub fn new(mut games: Vec<ScheduleGame>) -> Self {
        games.sort_by_key(|g| g.id);
        Self { games }
    }
}

#[async_trait]
impl ScheduleSource for StaticSchedule {
    async fn load_games(&self, _season_id: i64) -> Result<Vec<ScheduleGame>> {
        Ok(self.games.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: i64, status: &str) -> ScheduleRow {
        ScheduleRow {
            id,
            espn_game_id: format!("4016717{}", id),
            home_team: "kc".to_string(),
            away_team: "Buf".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 10, 20, 20, 25, 0).unwrap(),
            week: 7,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_row_conversion_uppercases_codes() {
        let game = ScheduleGame::from(row(5, "STATUS_FINAL"));
        assert_eq!(game.home_team_code, "KC");
        assert_eq!(game.away_team_code, "BUF");
        assert_eq!(game.status, GameStatus::Completed);
        assert_eq!(game.external_schedule_id, "40167175");
    }

    #[tokio::test]
    async fn test_static_schedule_is_ordered_by_id() {
        let games: Vec<ScheduleGame> = vec![row(9, "scheduled"), row(2, "scheduled")]
            .into_iter()
            .map(ScheduleGame::from)
            .collect();
        let source = StaticSchedule::new(games);

        let loaded = source.load_games(2024).await.unwrap();
        let ids: Vec<i64> = loaded.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2, 9]);
    }
}
