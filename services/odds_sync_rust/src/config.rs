//! Configuration for odds_sync_rust

use anyhow::{anyhow, Result};
use parlay_core::clients::{odds_api::DEFAULT_BASE_URL, OddsApiConfig};
use parlay_core::matching::MatchOptions;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub season_id: i64,

    // Feed
    pub odds_api_key: String,
    pub odds_api_base_url: String,
    pub odds_sport_key: String,
    pub odds_regions: String,
    pub odds_markets: String,
    pub odds_timeout_secs: u64,

    // Matching
    pub match_options: MatchOptions,

    /// Match and line writes go to in-memory stores
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let odds_api_key = required("ODDS_API_KEY")?;
        let season_id: i64 = required("SEASON_ID")?
            .parse()
            .map_err(|_| anyhow!("SEASON_ID must be a valid integer"))?;

        let defaults = MatchOptions::default();
        let confidence_threshold: u8 =
            parse_var(&lookup, "MATCH_CONFIDENCE_THRESHOLD", defaults.confidence_threshold)?;
        if confidence_threshold > 100 {
            return Err(anyhow!("MATCH_CONFIDENCE_THRESHOLD must be between 0 and 100"));
        }
        let time_tolerance_hours: f64 =
            parse_var(&lookup, "MATCH_TIME_TOLERANCE_HOURS", defaults.time_tolerance_hours)?;
        if !time_tolerance_hours.is_finite() || time_tolerance_hours < 0.0 {
            return Err(anyhow!("MATCH_TIME_TOLERANCE_HOURS must be >= 0"));
        }
        let enable_fuzzy: bool = parse_var(&lookup, "MATCH_ENABLE_FUZZY", defaults.enable_fuzzy_matching)?;
        let offset_hours: i32 = parse_var(&lookup, "MATCH_CALENDAR_UTC_OFFSET_HOURS", 0)?;
        if !(-23..=23).contains(&offset_hours) {
            return Err(anyhow!("MATCH_CALENDAR_UTC_OFFSET_HOURS must be between -23 and 23"));
        }

        Ok(Self {
            database_url,
            season_id,
            odds_api_key,
            odds_api_base_url: or_default("ODDS_API_BASE_URL", DEFAULT_BASE_URL),
            odds_sport_key: or_default("ODDS_SPORT_KEY", "americanfootball_nfl"),
            odds_regions: or_default("ODDS_REGIONS", "us"),
            odds_markets: or_default("ODDS_MARKETS", "h2h,spreads,totals"),
            odds_timeout_secs: parse_var(&lookup, "ODDS_API_TIMEOUT_SECS", 10)?,
            match_options: MatchOptions {
                confidence_threshold,
                time_tolerance_hours,
                enable_fuzzy_matching: enable_fuzzy,
                calendar_utc_offset_minutes: offset_hours * 60,
            },
            dry_run: parse_var(&lookup, "DRY_RUN", false)?,
        })
    }

    pub fn odds_api(&self) -> OddsApiConfig {
        OddsApiConfig {
            api_key: self.odds_api_key.clone(),
            base_url: self.odds_api_base_url.clone(),
            sport_key: self.odds_sport_key.clone(),
            regions: self.odds_regions.clone(),
            markets: self.odds_markets.clone(),
            timeout: Duration::from_secs(self.odds_timeout_secs),
        }
    }
}

/// Parse a variable with default fallback; a present but invalid value is an error
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    default: T,
) -> Result<T> {
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| anyhow!("{} has an invalid value '{}'", var_name, val)),
        None => Ok(default),
    }
}
