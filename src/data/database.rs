use anyhow::{Context, Result};
use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::data::migration::MigrationManager;
use crate::utils;

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type Connection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = include_str!("schema.sql");

/// Pooled SQLite database holding the category tables
#[derive(Clone)]
pub struct Database {
    pool: Arc<ConnectionPool>,
}

impl Database {
    /// Opens (creating if needed) the database described by `config`,
    /// applying the schema and pending migrations.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db_path = config.database_path.as_path();
        utils::ensure_directory_exists(db_path)?;

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
            .with_init(move |conn| {
                conn.busy_timeout(busy_timeout)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")
            });

        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .build(manager)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        let database = Self { pool: Arc::new(pool) };
        database.initialize(db_path)?;
        Ok(database)
    }

    fn initialize(&self, db_path: &Path) -> Result<()> {
        let conn = self.connection()?;

        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Failed to enable WAL journal mode")?;
        debug!("Journal mode for {}: {}", db_path.display(), mode);

        conn.execute_batch(SCHEMA)
            .context("Failed to apply category schema")?;
        MigrationManager::new(&conn).run_migrations()?;

        info!("Category database ready at {}", db_path.display());
        Ok(())
    }

    /// Checks out a pooled connection
    pub fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .context("Failed to get a connection from the pool")
    }
}
