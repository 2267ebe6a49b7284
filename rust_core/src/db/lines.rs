//! Betting line persistence for matched games.
//!
//! Lines are keyed by (schedule game id, bookmaker) and upserted, so a
//! re-run refreshes prices in place.

use super::retry::{execute_with_retry, RetryPolicy};
use crate::models::{BookmakerLines, GameLines};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;

/// A line write that stopped partway. Rows written before the failure
/// stay committed and are counted in `written`.
#[derive(Debug, Error)]
#[error("{cause:#} ({written} bookmaker rows written first)")]
pub struct LineWriteError {
    pub written: usize,
    pub cause: anyhow::Error,
}

#[async_trait]
pub trait LineStore: Send + Sync {
    /// Attach every bookmaker's lines to a schedule game.
    /// Returns the number of bookmaker rows written.
    async fn upsert_lines(
        &self,
        schedule_game_id: i64,
        lines: &GameLines,
    ) -> Result<usize, LineWriteError>;
}

/// Line store backed by the `game_lines` table
#[derive(Debug, Clone)]
pub struct PgLineStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgLineStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    async fn upsert_one(&self, schedule_game_id: i64, source_game_id: &str, lines: &BookmakerLines) -> Result<()> {
        let pool = &self.pool;
        execute_with_retry(self.retry, "game line upsert", move || async move {
            sqlx::query(
                r#"
                INSERT INTO game_lines (
                    game_id, bookmaker, source_game_id, last_update,
                    home_moneyline, away_moneyline,
                    home_spread, home_spread_price, away_spread_price,
                    total_points, over_price, under_price, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
                ON CONFLICT (game_id, bookmaker) DO UPDATE SET
                    source_game_id = EXCLUDED.source_game_id,
                    last_update = EXCLUDED.last_update,
                    home_moneyline = EXCLUDED.home_moneyline,
                    away_moneyline = EXCLUDED.away_moneyline,
                    home_spread = EXCLUDED.home_spread,
                    home_spread_price = EXCLUDED.home_spread_price,
                    away_spread_price = EXCLUDED.away_spread_price,
                    total_points = EXCLUDED.total_points,
                    over_price = EXCLUDED.over_price,
                    under_price = EXCLUDED.under_price,
                    updated_at = NOW()
                "#,
            )
            .bind(schedule_game_id)
            .bind(&lines.bookmaker)
            .bind(source_game_id)
            .bind(lines.last_update)
            .bind(lines.home_moneyline)
            .bind(lines.away_moneyline)
            .bind(lines.home_spread)
            .bind(lines.home_spread_price)
            .bind(lines.away_spread_price)
            .bind(lines.total_points)
            .bind(lines.over_price)
            .bind(lines.under_price)
            .execute(pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert {} lines for game {}",
                    lines.bookmaker, schedule_game_id
                )
            })?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LineStore for PgLineStore {
    async fn upsert_lines(
        &self,
        schedule_game_id: i64,
        lines: &GameLines,
    ) -> Result<usize, LineWriteError> {
        let mut written = 0;
        for bookmaker in lines.bookmakers.iter().filter(|b| !b.is_empty()) {
            if let Err(cause) = self
                .upsert_one(schedule_game_id, &lines.external_game_id, bookmaker)
                .await
            {
                return Err(LineWriteError { written, cause });
            }
            written += 1;
        }
        Ok(written)
    }
}

/// In-process line store, for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemoryLineStore {
    lines: Mutex<HashMap<(i64, String), BookmakerLines>>,
}

impl InMemoryLineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn get(&self, schedule_game_id: i64, bookmaker: &str) -> Option<BookmakerLines> {
        self.lines
            .lock()
            .get(&(schedule_game_id, bookmaker.to_string()))
            .cloned()
    }
}

#[async_trait]
impl LineStore for InMemoryLineStore {
    async fn upsert_lines(
        &self,
        schedule_game_id: i64,
        lines: &GameLines,
    ) -> Result<usize, LineWriteError> {
        let mut store = self.lines.lock();
        let mut written = 0;
        for bookmaker in lines.bookmakers.iter().filter(|b| !b.is_empty()) {
            store.insert((schedule_game_id, bookmaker.bookmaker.clone()), bookmaker.clone());
            written += 1;
        }
        Ok(written)
    }
}
