use anyhow::Result;

use crate::models::category::{AccessControl, Category, CategoryId};

/// Row-level access to category records.
///
/// Implementations are bound to a single connection or transaction so that
/// every call made during one tree operation sees the same state.
pub trait CategoryRepository {
    /// Retrieves a category by its ID
    fn get(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Retrieves the direct children of a category, ordered by `left`
    fn get_children(&self, parent_id: CategoryId) -> Result<Vec<Category>>;

    /// Retrieves every category whose `left` lies in `[left, right]`, ordered by `left`
    fn get_by_interval(&self, left: i64, right: i64) -> Result<Vec<Category>>;

    /// Retrieves every category whose interval contains `[left, right]`, ordered by `left`
    fn get_enclosing(&self, left: i64, right: i64) -> Result<Vec<Category>>;

    /// Retrieves all categories in depth-first order
    fn get_all(&self) -> Result<Vec<Category>>;

    fn count(&self) -> Result<i64>;

    /// Persists a new row, using `category.id` when it is non-zero
    fn create(&self, category: &Category) -> Result<CategoryId>;

    /// Writes presentation and access fields, never the interval or parent
    fn update(&self, category: &Category) -> Result<()>;

    fn delete(&self, id: CategoryId) -> Result<()>;

    fn set_parent(&self, id: CategoryId, parent_id: Option<CategoryId>) -> Result<()>;

    fn set_interval(&self, id: CategoryId, left: i64, right: i64) -> Result<()>;

    /// Adds `delta` to `right` of every row with `right >= from`
    fn shift_right_bounds(&self, from: i64, delta: i64) -> Result<usize>;

    /// Adds `delta` to `left` of every row with `left >= from`
    fn shift_left_bounds(&self, from: i64, delta: i64) -> Result<usize>;

    /// Removes every row with `left` in `[left, right]`
    fn delete_interval(&self, left: i64, right: i64) -> Result<usize>;

    /// Overwrites the access fields of rows strictly inside `(left, right)`
    fn update_access_within(&self, left: i64, right: i64, access: &AccessControl) -> Result<usize>;
}

/// Ad-store capability owned by the surrounding application
pub trait AdStore {
    /// Counts ads filed under exactly this category
    fn count_ads_in_category(&self, category_id: CategoryId, only_active: bool) -> Result<u64>;

    fn any_ads_in_category(&self, category_id: CategoryId) -> Result<bool>;
}

/// Access-check capability owned by the surrounding application
pub trait AccessCheck {
    fn has_access(&self, access: &AccessControl, required_level: u8) -> bool;
}
