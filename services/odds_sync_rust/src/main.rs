use anyhow::{Context, Result};
use dotenv::dotenv;
use odds_sync_rust::Config;
use parlay_core::clients::OddsApiClient;
use parlay_core::db::{
    check_connection, create_pool, DbPoolConfig, InMemoryLineStore, InMemoryMatchStore,
    LineStore, MatchStore, PgLineStore, PgMatchStore, PgScheduleStore,
};
use parlay_core::sync::{run_sync, SyncContext, SyncRequest};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        error!("Odds sync failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    info!("Starting odds sync...");

    let config = Config::from_env().context("Invalid configuration")?;

    // Database
    let pool = create_pool(&config.database_url, &DbPoolConfig::from_env()).await?;
    check_connection(&pool).await?;

    // Clients
    let odds = OddsApiClient::new(config.odds_api())?;
    let schedule = PgScheduleStore::new(pool.clone());

    let (matches, lines): (Box<dyn MatchStore>, Box<dyn LineStore>) = if config.dry_run {
        warn!("DRY_RUN enabled: match records and lines will not be written");
        (
            Box::new(InMemoryMatchStore::new()),
            Box::new(InMemoryLineStore::new()),
        )
    } else {
        (
            Box::new(PgMatchStore::new(pool.clone())),
            Box::new(PgLineStore::new(pool.clone())),
        )
    };

    let ctx = SyncContext {
        odds: &odds,
        schedule: &schedule,
        matches: matches.as_ref(),
        lines: lines.as_ref(),
    };
    let request = SyncRequest {
        season_id: config.season_id,
        options: config.match_options,
    };

    let report = run_sync(&ctx, &request).await?;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize sync report")?;
    println!("{}", json);

    if !report.fully_persisted() {
        warn!(
            "Sync {} finished with {} match and {} line persistence failures",
            report.run_id, report.persistence_failures, report.line_failures
        );
    }

    pool.close().await;
    Ok(())
}
