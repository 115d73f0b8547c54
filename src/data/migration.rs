use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, Error as SqliteError};

/// A column added to a table after its first release
struct AddColumn {
    name: &'static str,
    table: &'static str,
    column: &'static str,
    definition: &'static str,
}

const COLUMN_MIGRATIONS: &[AddColumn] = &[
    AddColumn {
        name: "add_image_to_categories",
        table: "categories",
        column: "image",
        definition: "TEXT NULL",
    },
    AddColumn {
        name: "add_fg_color_to_categories",
        table: "categories",
        column: "fg_color",
        definition: "TEXT NULL",
    },
    AddColumn {
        name: "add_bg_color_to_categories",
        table: "categories",
        column: "bg_color",
        definition: "TEXT NULL",
    },
    AddColumn {
        name: "add_expires_at_to_ads",
        table: "ads",
        column: "expires_at",
        definition: "TEXT NULL",
    },
];

/// Database migration manager that handles schema updates
pub struct MigrationManager<'a> {
    connection: &'a Connection,
}

impl<'a> MigrationManager<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Run all necessary migrations to update the database schema
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        self.create_migrations_table()?;
        for migration in COLUMN_MIGRATIONS {
            self.apply_add_column(migration)?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    fn create_migrations_table(&self) -> Result<()> {
        debug!("Creating migrations table if it doesn't exist");

        self.connection
            .execute(
                "CREATE TABLE IF NOT EXISTS migrations (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    applied_at TEXT NOT NULL
                )",
                [],
            )
            .context("Failed to create migrations table")?;

        Ok(())
    }

    fn is_migration_applied(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM migrations WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .context("Failed to check if migration has been applied")?;

        Ok(count > 0)
    }

    fn record_migration(&self, name: &str) -> Result<()> {
        debug!("Recording migration '{}' as applied", name);

        self.connection
            .execute(
                "INSERT INTO migrations (name, applied_at) VALUES (?, datetime('now'))",
                [name],
            )
            .context("Failed to record migration")?;

        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        match self.connection.query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?",
            [table],
            |_| Ok(true),
        ) {
            Ok(_) => Ok(true),
            Err(SqliteError::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to check if {} table exists", table)),
        }
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        match self.connection.query_row(
            "SELECT 1 FROM pragma_table_info(?) WHERE name=?",
            [table, column],
            |_| Ok(true),
        ) {
            Ok(_) => Ok(true),
            Err(SqliteError::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to check if {} column exists", column)),
        }
    }

    /// Adds a column unless an older schema or a concurrent run already did
    fn apply_add_column(&self, migration: &AddColumn) -> Result<()> {
        if self.is_migration_applied(migration.name)? {
            debug!("Migration '{}' already recorded as applied, skipping", migration.name);
            return Ok(());
        }

        info!("Running migration: {}", migration.name);

        if !self.table_exists(migration.table)? {
            debug!(
                "Table '{}' does not exist yet - column will come from schema creation",
                migration.table
            );
            return self.record_migration(migration.name);
        }

        if self.column_exists(migration.table, migration.column)? {
            debug!("Column '{}' already exists in {}", migration.column, migration.table);
        } else {
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                migration.table, migration.column, migration.definition
            );
            match self.connection.execute(&sql, []) {
                Ok(_) => info!("Added {} column to {} table", migration.column, migration.table),
                Err(e) if e.to_string().contains("duplicate column name") => {
                    info!("Column '{}' already exists (concurrent addition detected)", migration.column);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to add {} column to {} table", migration.column, migration.table)
                    })
                }
            }
        }

        self.record_migration(migration.name)
    }
}
