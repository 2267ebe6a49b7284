//! odds_sync_rust - one-shot odds feed to schedule sync

pub mod config;

pub use config::Config;
