//! The Odds API (v4) client.
//!
//! Fetches upcoming games with bookmaker lines for one sport and turns them
//! into validated `ExternalGame`s plus the `GameLines` payload that gets
//! attached once a game is matched. Failures are returned to the caller;
//! there is no retry here.

use super::{FeedBatch, FeedGame, OddsSource};
use crate::models::{parse_external_games, BookmakerLines, GameLines};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source tag stamped on games and match records from this feed
pub const ODDS_API_SOURCE: &str = "odds_api";

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";

#[derive(Debug, Clone)]
pub struct OddsApiConfig {
    pub api_key: String,
    pub base_url: String,
    /// e.g. "americanfootball_nfl"
    pub sport_key: String,
    pub regions: String,
    pub markets: String,
    pub timeout: Duration,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            sport_key: "americanfootball_nfl".to_string(),
            regions: "us".to_string(),
            markets: "h2h,spreads,totals".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct EventLines {
    id: String,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
struct Bookmaker {
    key: String,
    #[serde(default)]
    last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct Market {
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    name: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
pub struct OddsApiClient {
    client: Client,
    config: OddsApiConfig,
}

impl std::fmt::Debug for OddsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OddsApiClient")
            .field("base_url", &self.config.base_url)
            .field("sport_key", &self.config.sport_key)
            .finish()
    }
}

impl OddsApiClient {
    pub fn new(config: OddsApiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(anyhow!("Odds API key is not configured"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    async fn fetch_raw(&self) -> Result<Value> {
        let url = format!(
            "{}/sports/{}/odds",
            self.config.base_url.trim_end_matches('/'),
            self.config.sport_key
        );
        debug!("Fetching odds from {}", url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.config.api_key.as_str()),
                ("regions", self.config.regions.as_str()),
                ("markets", self.config.markets.as_str()),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .context("Odds API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Odds API error {}: {}", status, body));
        }

        if let Some(remaining) = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!("Odds API requests remaining: {}", remaining);
        }

        resp.json::<Value>()
            .await
            .context("Failed to decode Odds API response")
    }
}

#[async_trait]
impl OddsSource for OddsApiClient {
    fn source_tag(&self) -> &str {
        ODDS_API_SOURCE
    }

    async fn fetch_games(&self) -> Result<FeedBatch> {
        let payload = self.fetch_raw().await?;
        let batch = parse_feed(&payload)?;
        info!(
            "Fetched {} {} games from Odds API ({} rejected)",
            batch.games.len(),
            self.config.sport_key,
            batch.rejected.len()
        );
        Ok(batch)
    }
}

/// Validate a raw Odds API payload and pair each game with its lines
pub fn parse_feed(payload: &Value) -> Result<FeedBatch> {
    let validated = parse_external_games(payload, ODDS_API_SOURCE)?;

    let mut lines_by_id: HashMap<String, GameLines> = HashMap::new();
    if let Some(entries) = payload.as_array() {
        for entry in entries {
            match serde_json::from_value::<EventLines>(entry.clone()) {
                Ok(event) => {
                    let lines = extract_lines(&event);
                    lines_by_id.insert(lines.external_game_id.clone(), lines);
                }
                Err(e) => debug!("Skipping lines for malformed event: {}", e),
            }
        }
    }

    let games = validated
        .games
        .into_iter()
        .map(|game| {
            let lines = lines_by_id.remove(&game.id).unwrap_or_else(|| GameLines {
                external_game_id: game.id.clone(),
                bookmakers: Vec::new(),
            });
            FeedGame { game, lines }
        })
        .collect();

    Ok(FeedBatch {
        games,
        rejected: validated.rejected,
    })
}

fn extract_lines(event: &EventLines) -> GameLines {
    let bookmakers = event
        .bookmakers
        .iter()
        .map(|b| bookmaker_lines(b, &event.home_team, &event.away_team))
        .collect();

    // Validated game ids are trimmed; key lines the same way
    GameLines {
        external_game_id: event.id.trim().to_string(),
        bookmakers,
    }
}

fn bookmaker_lines(bookmaker: &Bookmaker, home_team: &str, away_team: &str) -> BookmakerLines {
    let mut lines = BookmakerLines {
        bookmaker: bookmaker.key.clone(),
        last_update: bookmaker.last_update,
        ..Default::default()
    };

    for market in &bookmaker.markets {
        match market.key.as_str() {
            "h2h" => {
                for outcome in &market.outcomes {
                    if outcome.name == home_team {
                        lines.home_moneyline = Some(outcome.price);
                    } else if outcome.name == away_team {
                        lines.away_moneyline = Some(outcome.price);
                    }
                }
            }
            "spreads" => {
                for outcome in &market.outcomes {
                    if outcome.name == home_team {
                        lines.home_spread = outcome.point;
                        lines.home_spread_price = Some(outcome.price);
                    } else if outcome.name == away_team {
                        lines.away_spread_price = Some(outcome.price);
                    }
                }
            }
            "totals" => {
                for outcome in &market.outcomes {
                    match outcome.name.as_str() {
                        "Over" => {
                            lines.total_points = outcome.point;
                            lines.over_price = Some(outcome.price);
                        }
                        "Under" => {
                            lines.total_points = lines.total_points.or(outcome.point);
                            lines.under_price = Some(outcome.price);
                        }
                        other => warn!("Unexpected totals outcome '{}' from {}", other, bookmaker.key),
                    }
                }
            }
            other => debug!("Ignoring market '{}' from {}", other, bookmaker.key),
        }
    }

    lines
}
