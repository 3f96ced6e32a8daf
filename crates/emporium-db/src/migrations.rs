//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied when a [`Database`](crate::Database) opens (unless the config
//! turns that off).
//!
//! ```text
//! Database::new ──► MIGRATOR.run ──► _sqlx_migrations
//!                        │                 │
//!                        │   applied? ◄────┘
//!                        ▼
//!              001_initial_schema.sql   users, products, listing indexes
//!              002_...                  (append only)
//! ```
//!
//! Files are append-only: a released migration is never edited, a new
//! `NNN_description.sql` is added instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
///
/// Safe to call on an up-to-date database; each file runs in its own
/// transaction, in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    debug!(total, applied, "Migration status before run");

    MIGRATOR.run(pool).await?;

    if applied < total {
        info!(count = total - applied, "Applied pending migrations");
    }
    Ok(())
}

/// `(embedded, applied)` migration counts, reported by the readiness check.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table doesn't exist before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================
