//! Database access for the sync pipeline.
//!
//! - `schedule`: read-only schedule snapshot per season
//! - `match_store`: idempotent match audit records and statistics
//! - `lines`: betting lines attached to matched games
//! - `pool` / `retry`: connection setup and transient-error retry

pub mod lines;
pub mod match_store;
pub mod pool;
pub mod retry;
pub mod schedule;

pub use lines::{InMemoryLineStore, LineStore, LineWriteError, PgLineStore};
pub use match_store::{InMemoryMatchStore, MatchStore, PgMatchStore};
pub use pool::{check_connection, create_pool, DbPoolConfig};
pub use retry::{execute_with_retry, RetryPolicy};
pub use schedule::{PgScheduleStore, ScheduleSource, StaticSchedule};
