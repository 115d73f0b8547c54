use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::base::repository::AdStore;
use crate::models::category::CategoryId;

/// Read-only view of the application's `ads` table over one connection.
///
/// Built on the same connection or transaction as the category repository,
/// so a tree operation never checks out a second pooled connection.
/// An ad is active while `expires_at` is unset or still in the future.
pub struct SqliteAdStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteAdStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl AdStore for SqliteAdStore<'_> {
    fn count_ads_in_category(&self, category_id: CategoryId, only_active: bool) -> Result<u64> {
        let count: i64 = (if only_active {
            self.conn.query_row(
                "SELECT COUNT(*) FROM ads
                 WHERE category_id = ? AND (expires_at IS NULL OR expires_at > ?)",
                params![category_id, Utc::now()],
                |row| row.get(0),
            )
        } else {
            self.conn.query_row(
                "SELECT COUNT(*) FROM ads WHERE category_id = ?",
                [category_id],
                |row| row.get(0),
            )
        })
        .with_context(|| format!("Failed to count ads in category {}", category_id))?;

        Ok(count.max(0) as u64)
    }

    fn any_ads_in_category(&self, category_id: CategoryId) -> Result<bool> {
        let exists = self
            .conn
            .prepare_cached("SELECT EXISTS(SELECT 1 FROM ads WHERE category_id = ?)")?
            .query_row([category_id], |row| row.get(0))
            .with_context(|| format!("Failed to look up ads in category {}", category_id))?;
        Ok(exists)
    }
}
