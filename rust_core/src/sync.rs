//! One odds sync run.
//!
//! fetch feed -> load schedule -> match -> upsert match records -> attach
//! lines -> statistics readback.
//!
//! Feed and schedule failures abort the run before anything is written.
//! Write failures after matching do not: they are counted in the report
//! next to the match summary, which stays intact.

use crate::clients::{FeedGame, OddsSource};
use crate::db::{LineStore, MatchStore, ScheduleSource};
use crate::matching::{to_storage_records, GameMatcher, MatchOptions, MatchStatistics, MatchingSummary};
use crate::models::ExternalGame;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Collaborators a run talks to
pub struct SyncContext<'a> {
    pub odds: &'a dyn OddsSource,
    pub schedule: &'a dyn ScheduleSource,
    pub matches: &'a dyn MatchStore,
    pub lines: &'a dyn LineStore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncRequest {
    pub season_id: i64,
    pub options: MatchOptions,
}

/// What a run did, returned to the caller as JSON
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub elapsed_ms: u64,
    pub season_id: i64,
    pub source: String,
    /// Feed entries dropped by input validation
    pub rejected_entries: usize,
    pub summary: MatchingSummary,
    pub records_persisted: usize,
    pub persistence_failures: usize,
    pub lines_attached: usize,
    pub line_failures: usize,
    /// None when the readback itself failed
    pub statistics: Option<MatchStatistics>,
}

impl SyncReport {
    /// True when every accepted match and its lines were stored
    pub fn fully_persisted(&self) -> bool {
        self.persistence_failures == 0 && self.line_failures == 0
    }
}

/// Execute one sync run
pub async fn run_sync(ctx: &SyncContext<'_>, request: &SyncRequest) -> Result<SyncReport> {
    let run_id = Uuid::new_v4();
    let started = Instant::now();
    let source = ctx.odds.source_tag().to_string();

    let feed = ctx
        .odds
        .fetch_games()
        .await
        .with_context(|| format!("Failed to fetch games from {}", source))?;

    let schedule = ctx
        .schedule
        .load_games(request.season_id)
        .await
        .context("Failed to load schedule snapshot")?;

    info!(
        "Sync {}: {} feed games ({} rejected) against {} schedule games for season {}",
        run_id,
        feed.games.len(),
        feed.rejected.len(),
        schedule.len(),
        request.season_id
    );

    let external: Vec<ExternalGame> = feed.games.iter().map(|f| f.game.clone()).collect();
    let summary = GameMatcher::nfl(request.options).match_games(&external, &schedule);

    let records = to_storage_records(&summary.matches, &source);
    let mut records_persisted = 0;
    let mut persistence_failures = 0;
    for record in &records {
        match ctx.matches.upsert(record).await {
            Ok(()) => records_persisted += 1,
            Err(e) => {
                persistence_failures += 1;
                error!("Failed to persist match {}: {:#}", record.source_game_id, e);
            }
        }
    }

    let (lines_attached, line_failures) = attach_lines(ctx.lines, &summary, &feed.games).await;

    let statistics = match ctx.matches.statistics().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Failed to read match statistics: {:#}", e);
            None
        }
    };

    let report = SyncReport {
        run_id,
        elapsed_ms: started.elapsed().as_millis() as u64,
        season_id: request.season_id,
        source,
        rejected_entries: feed.rejected.len(),
        summary,
        records_persisted,
        persistence_failures,
        lines_attached,
        line_failures,
        statistics,
    };

    info!(
        "Sync {} finished in {}ms: {} matched, {} unmatched, {} persisted, {} persistence failures, {} line rows",
        report.run_id,
        report.elapsed_ms,
        report.summary.matched_games,
        report.summary.unmatched_games,
        report.records_persisted,
        report.persistence_failures,
        report.lines_attached
    );

    Ok(report)
}

/// Attach each matched game's lines to its schedule game.
/// Returns (bookmaker rows written, games whose lines failed to store).
/// Rows committed before a mid-game failure still count as written.
async fn attach_lines(
    store: &dyn LineStore,
    summary: &MatchingSummary,
    feed: &[FeedGame],
) -> (usize, usize) {
    let lines_by_id: HashMap<&str, &FeedGame> =
        feed.iter().map(|f| (f.game.id.as_str(), f)).collect();

    let mut attached = 0;
    let mut failures = 0;
    for m in &summary.matches {
        let Some(feed_game) = lines_by_id.get(m.external_game.id.as_str()) else {
            continue;
        };
        if feed_game.lines.bookmakers.is_empty() {
            continue;
        }

        match store.upsert_lines(m.schedule_game.id, &feed_game.lines).await {
            Ok(written) => attached += written,
            Err(e) => {
                attached += e.written;
                failures += 1;
                error!(
                    "Failed to attach lines from {} to game {}: {}",
                    m.external_game.id, m.schedule_game.id, e
                );
            }
        }
    }

    (attached, failures)
}
