use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::base::repository::CategoryRepository;
use crate::data::types::CATEGORY_COLUMNS;
use crate::models::category::{AccessControl, Category, CategoryId, DisplayColors};

/// SQLite implementation of [`CategoryRepository`] over one connection.
///
/// Pass a `rusqlite::Transaction` (it derefs to `Connection`) to group
/// several calls into one atomic unit.
pub struct SqliteCategoryRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCategoryRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn map_row(row: &Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            keywords: row.get(4)?,
            image: row.get(5)?,
            colors: DisplayColors {
                foreground: row.get(6)?,
                background: row.get(7)?,
            },
            left: row.get(8)?,
            right: row.get(9)?,
            access: AccessControl {
                owner_id: row.get(10)?,
                group_id: row.get(11)?,
                perm_owner: row.get(12)?,
                perm_group: row.get(13)?,
                perm_members: row.get(14)?,
                perm_anon: row.get(15)?,
            },
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    fn query_categories<P: rusqlite::Params>(&self, filter: &str, params: P) -> Result<Vec<Category>> {
        let sql = format!("SELECT {} FROM categories {}", CATEGORY_COLUMNS, filter);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let categories = stmt
            .query_map(params, Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        self.conn
            .query_row(&sql, [id], Self::map_row)
            .optional()
            .with_context(|| format!("Failed to load category {}", id))
    }

    fn get_children(&self, parent_id: CategoryId) -> Result<Vec<Category>> {
        self.query_categories("WHERE parent_id = ? ORDER BY lft, id", [parent_id])
            .with_context(|| format!("Failed to load children of category {}", parent_id))
    }

    fn get_by_interval(&self, left: i64, right: i64) -> Result<Vec<Category>> {
        self.query_categories("WHERE lft BETWEEN ? AND ? ORDER BY lft", [left, right])
            .with_context(|| format!("Failed to load categories within [{}, {}]", left, right))
    }

    fn get_enclosing(&self, left: i64, right: i64) -> Result<Vec<Category>> {
        self.query_categories("WHERE lft <= ? AND rgt >= ? ORDER BY lft", [left, right])
            .with_context(|| format!("Failed to load categories enclosing [{}, {}]", left, right))
    }

    fn get_all(&self) -> Result<Vec<Category>> {
        self.query_categories("ORDER BY lft, id", [])
            .context("Failed to load categories")
    }

    fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count)
    }

    fn create(&self, category: &Category) -> Result<CategoryId> {
        let id = (category.id.0 > 0).then_some(category.id);
        self.conn
            .execute(
                "INSERT INTO categories (
                    id, parent_id, name, description, keywords, image, fg_color, bg_color,
                    lft, rgt, owner_id, group_id, perm_owner, perm_group, perm_members,
                    perm_anon, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    category.parent_id,
                    category.name,
                    category.description,
                    category.keywords,
                    category.image,
                    category.colors.foreground,
                    category.colors.background,
                    category.left,
                    category.right,
                    category.access.owner_id,
                    category.access.group_id,
                    category.access.perm_owner,
                    category.access.perm_group,
                    category.access.perm_members,
                    category.access.perm_anon,
                    category.created_at,
                    category.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert category '{}'", category.name))?;
        Ok(CategoryId(self.conn.last_insert_rowid()))
    }

    fn update(&self, category: &Category) -> Result<()> {
        self.conn
            .execute(
                "UPDATE categories SET
                    name = ?, description = ?, keywords = ?, image = ?,
                    fg_color = ?, bg_color = ?, owner_id = ?, group_id = ?,
                    perm_owner = ?, perm_group = ?, perm_members = ?, perm_anon = ?,
                    updated_at = ?
                 WHERE id = ?",
                params![
                    category.name,
                    category.description,
                    category.keywords,
                    category.image,
                    category.colors.foreground,
                    category.colors.background,
                    category.access.owner_id,
                    category.access.group_id,
                    category.access.perm_owner,
                    category.access.perm_group,
                    category.access.perm_members,
                    category.access.perm_anon,
                    category.updated_at,
                    category.id,
                ],
            )
            .with_context(|| format!("Failed to update category {}", category.id))?;
        Ok(())
    }

    fn delete(&self, id: CategoryId) -> Result<()> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?", [id])
            .with_context(|| format!("Failed to delete category {}", id))?;
        Ok(())
    }

    fn set_parent(&self, id: CategoryId, parent_id: Option<CategoryId>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE categories SET parent_id = ? WHERE id = ?",
                params![parent_id, id],
            )
            .with_context(|| format!("Failed to re-parent category {}", id))?;
        Ok(())
    }

    fn set_interval(&self, id: CategoryId, left: i64, right: i64) -> Result<()> {
        self.conn
            .prepare_cached("UPDATE categories SET lft = ?, rgt = ? WHERE id = ?")?
            .execute(params![left, right, id])
            .with_context(|| format!("Failed to write interval of category {}", id))?;
        Ok(())
    }

    fn shift_right_bounds(&self, from: i64, delta: i64) -> Result<usize> {
        self.conn
            .execute("UPDATE categories SET rgt = rgt + ? WHERE rgt >= ?", [delta, from])
            .context("Failed to shift right bounds")
    }

    fn shift_left_bounds(&self, from: i64, delta: i64) -> Result<usize> {
        self.conn
            .execute("UPDATE categories SET lft = lft + ? WHERE lft >= ?", [delta, from])
            .context("Failed to shift left bounds")
    }

    fn delete_interval(&self, left: i64, right: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM categories WHERE lft BETWEEN ? AND ?", [left, right])
            .with_context(|| format!("Failed to delete categories within [{}, {}]", left, right))
    }

    fn update_access_within(&self, left: i64, right: i64, access: &AccessControl) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE categories SET
                    owner_id = ?, group_id = ?, perm_owner = ?, perm_group = ?,
                    perm_members = ?, perm_anon = ?
                 WHERE lft > ? AND rgt < ?",
                params![
                    access.owner_id,
                    access.group_id,
                    access.perm_owner,
                    access.perm_group,
                    access.perm_members,
                    access.perm_anon,
                    left,
                    right,
                ],
            )
            .context("Failed to propagate access fields")
    }
}
