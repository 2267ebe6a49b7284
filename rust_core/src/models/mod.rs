// Shared models for the parlay sync pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod validate;

pub use validate::{parse_external_games, EntryError, RejectedEntry, ValidatedBatch, ValidationError};

// ============================================================================
// Game Status
// ============================================================================

/// Lifecycle of a game in the schedule store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Live,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::Live => "live",
            GameStatus::Completed => "completed",
        }
    }

    /// Parse a stored status string.
    ///
    /// Accepts both our own names and ESPN status names ("STATUS_IN_PROGRESS",
    /// "STATUS_FINAL"), since rows are seeded from the ESPN scoreboard.
    /// Anything unrecognised is treated as scheduled.
    pub fn from_status_str(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "live" | "in_progress" | "status_in_progress" | "status_halftime"
            | "status_end_period" => GameStatus::Live,
            "completed" | "final" | "status_final" | "status_final_overtime" => {
                GameStatus::Completed
            }
            _ => GameStatus::Scheduled,
        }
    }
}

// ============================================================================
// Games
// ============================================================================

/// A game as listed by a third-party odds/markets feed.
///
/// Team names are free text in whatever spelling the feed uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalGame {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    pub source: String,
}

impl ExternalGame {
    pub fn new(
        id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        commence_time: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            commence_time,
            sport: None,
            source: source.into(),
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }
}

/// A game from the authoritative schedule store, keyed by canonical team codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub id: i64,
    pub external_schedule_id: String,
    pub home_team_code: String,
    pub away_team_code: String,
    pub start_time: DateTime<Utc>,
    pub week: i32,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: GameStatus,
}

/// Schedule rows carry free-form status strings (ours or ESPN's)
fn deserialize_status<'de, D>(deserializer: D) -> Result<GameStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(GameStatus::from_status_str(&raw))
}

// ============================================================================
// Betting Lines (payload attached to matched games)
// ============================================================================

/// Lines posted by a single bookmaker for one game. Prices are American odds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmakerLines {
    pub bookmaker: String,
    pub last_update: Option<DateTime<Utc>>,
    pub home_moneyline: Option<f64>,
    pub away_moneyline: Option<f64>,
    /// Home spread in points (negative when home is favoured)
    pub home_spread: Option<f64>,
    pub home_spread_price: Option<f64>,
    pub away_spread_price: Option<f64>,
    pub total_points: Option<f64>,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
}

impl BookmakerLines {
    /// True when the bookmaker posted nothing we can use
    pub fn is_empty(&self) -> bool {
        self.home_moneyline.is_none()
            && self.away_moneyline.is_none()
            && self.home_spread.is_none()
            && self.total_points.is_none()
    }
}

/// All bookmaker lines the feed carried for one external game
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLines {
    pub external_game_id: String,
    pub bookmakers: Vec<BookmakerLines>,
}
