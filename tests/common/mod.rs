#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use classifieds_categories::{
    CategoryId, CategoryTreeStore, Database, NewCategory, StoreConfig,
};

/// A store over a throwaway on-disk database
pub struct TestTree {
    _dir: TempDir,
    pub database: Arc<Database>,
    pub store: CategoryTreeStore,
}

pub fn open_tree() -> Result<TestTree> {
    open_tree_with(|config| config.verify(true))
}

pub fn open_tree_with(adjust: impl FnOnce(StoreConfig) -> StoreConfig) -> Result<TestTree> {
    let dir = tempfile::tempdir()?;
    let config = adjust(StoreConfig::with_database_path(dir.path().join("categories.db")));
    let database = Arc::new(Database::open(&config)?);
    let store = CategoryTreeStore::with_database(database.clone(), config)?;
    Ok(TestTree {
        _dir: dir,
        database,
        store,
    })
}

impl TestTree {
    pub fn insert(&self, parent: i64, name: &str) -> Result<CategoryId> {
        Ok(self.store.insert(NewCategory::new(CategoryId(parent), name))?.id)
    }

    pub fn add_ad(&self, category: i64, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        self.database.connection()?.execute(
            "INSERT INTO ads (category_id, title, expires_at) VALUES (?, 'ad', ?)",
            rusqlite::params![category, expires_at],
        )?;
        Ok(())
    }

    pub fn execute(&self, sql: &str) -> Result<usize> {
        Ok(self.database.connection()?.execute(sql, [])?)
    }

    /// Every `(id, left, right)` triple ordered by id
    pub fn layout(&self) -> Result<Vec<(i64, i64, i64)>> {
        let conn = self.database.connection()?;
        let mut stmt = conn.prepare("SELECT id, lft, rgt FROM categories ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn interval(&self, id: i64) -> Result<(i64, i64)> {
        let category = self.store.get(CategoryId(id))?;
        Ok((category.left, category.right))
    }

    pub fn ids(categories: &[classifieds_categories::Category]) -> Vec<i64> {
        categories.iter().map(|c| c.id.0).collect()
    }
}
