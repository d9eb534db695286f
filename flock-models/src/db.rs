//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling. A `Database` is the
//! explicit store handle every service receives; connections are acquired
//! per unit of work and returned to the pool on drop.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use flock_core::config::DatabaseConfig;
use flock_core::error::{FlockError, FlockResult};

use crate::migrations;
use crate::schema;
use crate::sql::sql_error;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled connection handed out by [`Database::conn`].
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Store handle: connection pool plus the process-wide write lock.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
    /// Serializes multi-statement write transactions between the daily job
    /// and interactive commands.
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// Creates parent directories, builds the pool, optionally runs an
    /// integrity check, creates the schema, and applies pending migrations.
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> FlockResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| FlockError::Storage(format!("failed to build connection pool: {e}")))?;

        let db = Self {
            pool: Arc::new(pool),
            write_lock: Arc::new(Mutex::new(())),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("database initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> FlockResult<DbConn> {
        self.pool.get().map_err(|e| {
            error!("connection pool exhausted or unavailable: {e}");
            FlockError::Storage(format!("connection pool: {e}"))
        })
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> FlockResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| sql_error("integrity check", e))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(FlockError::IntegrityCheck(result));
        }

        debug!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a write transaction.
    ///
    /// Holds the write lock for the whole transaction. Commits when `f`
    /// returns `Ok`; any `Err` drops the transaction, which rolls it back.
    pub fn transaction<T, F>(&self, f: F) -> FlockResult<T>
    where
        F: FnOnce(&Connection) -> FlockResult<T>,
    {
        // The guarded value is unit, so a poisoned lock carries no broken state.
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| sql_error("begin transaction", e))?;

        let result = f(&tx)?;

        tx.commit().map_err(|e| sql_error("commit transaction", e))?;

        Ok(result)
    }

    /// Get database statistics (row counts per table).
    pub fn stats(&self) -> FlockResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |table: &str| -> FlockResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(|e| sql_error(&format!("count {table}"), e))
        };

        Ok(DatabaseStats {
            members: count("members")?,
            demographics: count("demographics")?,
            events: count("events")?,
            volunteer_opportunities: count("volunteer_opportunities")?,
            member_volunteering: count("member_volunteering")?,
            sent_notifications: count("sent_notifications")?,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> FlockResult<()> {
        warn!("resetting database - all data will be lost");
        self.transaction(|conn| {
            schema::drop_tables(conn)?;
            schema::create_tables(conn)?;
            migrations::run_migrations(conn)
        })?;
        info!("database reset complete");
        Ok(())
    }
}

/// Database row count statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub members: i64,
    pub demographics: i64,
    pub events: i64,
    pub volunteer_opportunities: i64,
    pub member_volunteering: i64,
    pub sent_notifications: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "members={}, demographics={}, events={}, volunteer_opportunities={}, member_volunteering={}, sent_notifications={}",
            self.members, self.demographics, self.events, self.volunteer_opportunities,
            self.member_volunteering, self.sent_notifications
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        }

        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}
