use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::models::category::CategoryId;

impl ToSql for CategoryId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.0.into())
    }
}

impl FromSql for CategoryId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(CategoryId)
    }
}

/// Column list shared by every category SELECT, in `map_row` order
pub const CATEGORY_COLUMNS: &str = "id, parent_id, name, description, keywords, image, \
     fg_color, bg_color, lft, rgt, owner_id, group_id, \
     perm_owner, perm_group, perm_members, perm_anon, created_at, updated_at";
