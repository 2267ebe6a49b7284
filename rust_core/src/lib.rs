//! Parlay Core - odds-to-schedule game matching for the parlay challenge.
//!
//! This crate provides:
//! - Team name normalization (feed display names -> canonical codes)
//! - Confidence-scored matching of odds-feed games to schedule games
//! - Idempotent match audit records and statistics
//! - The Odds API client and Postgres-backed stores
//! - A one-shot sync pipeline tying them together

pub mod clients;
pub mod db;
pub mod matching;
pub mod models;
pub mod sync;

pub use matching::{
    match_games, GameMatcher, MatchOptions, MatchResult, MatchType, MatchingSummary,
    TeamNormalizer, UnmatchedReason,
};
pub use models::{ExternalGame, GameStatus, ScheduleGame};
pub use sync::{run_sync, SyncContext, SyncReport, SyncRequest};
