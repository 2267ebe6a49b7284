//! External feed clients.

use crate::models::{ExternalGame, GameLines, RejectedEntry};
use anyhow::Result;
use async_trait::async_trait;

pub mod odds_api;

pub use odds_api::{OddsApiClient, OddsApiConfig, ODDS_API_SOURCE};

/// One validated game from an odds feed, with the lines it carried
#[derive(Debug, Clone, PartialEq)]
pub struct FeedGame {
    pub game: ExternalGame,
    pub lines: GameLines,
}

/// A fetched and validated feed response
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub games: Vec<FeedGame>,
    /// Entries dropped by input validation
    pub rejected: Vec<RejectedEntry>,
}

/// A source of externally-listed games
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Tag stamped on match records from this source
    fn source_tag(&self) -> &str;

    async fn fetch_games(&self) -> Result<FeedBatch>;
}
