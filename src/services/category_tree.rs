use log::{debug, info};
use parking_lot::RwLock;
use rusqlite::TransactionBehavior;
use std::sync::Arc;

use crate::base::repository::AccessCheck;
use crate::config::StoreConfig;
use crate::data::{Database, SqliteAdStore, SqliteCategoryRepository};
use crate::error::TreeResult;
use crate::models::category::{AccessControl, Category, CategoryId, NewCategory};
use crate::services::tree_mutator::TreeMutator;
use crate::services::tree_reader::{Breadcrumb, SubtreeCache, TreeReader};
use crate::utils::TreeInspector;

/// The category tree: one coherent nested-set hierarchy shared by all callers.
///
/// Mutations hold the exclusive side of `tree_lock` and run inside a single
/// `BEGIN IMMEDIATE` transaction that is only committed once the whole
/// operation succeeded. Reads share the lock and never see a half-shifted tree.
///
/// Every operation uses exactly one pooled connection: the category rows and
/// the `ads` table are both read through it.
pub struct CategoryTreeStore {
    database: Arc<Database>,
    config: StoreConfig,
    tree_lock: RwLock<()>,
}

impl CategoryTreeStore {
    /// Opens the database named by `config`, reading ads from its `ads` table
    pub fn open(config: StoreConfig) -> TreeResult<Self> {
        let database = Arc::new(Database::open(&config)?);
        Self::with_database(database, config)
    }

    /// Builds a store around an existing database, creating the root
    /// category if the table is empty
    pub fn with_database(database: Arc<Database>, config: StoreConfig) -> TreeResult<Self> {
        let store = Self {
            database,
            config,
            tree_lock: RwLock::new(()),
        };
        let root_name = store.config.root_name.clone();
        store.ensure_root(&root_name)?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn write<T>(&self, op: impl FnOnce(&TreeMutator<'_>) -> TreeResult<T>) -> TreeResult<T> {
        let _guard = self.tree_lock.write();
        let mut conn = self.database.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteCategoryRepository::new(&tx);
        let ads = SqliteAdStore::new(&tx);

        // Dropping `tx` on any early return rolls the whole operation back
        let result = op(&TreeMutator::new(&repo, &ads))?;
        if self.config.verify_after_mutation {
            TreeInspector::verify(&repo)?;
        }

        tx.commit()?;
        Ok(result)
    }

    fn read<T>(&self, op: impl FnOnce(&TreeReader<'_>) -> TreeResult<T>) -> TreeResult<T> {
        let _guard = self.tree_lock.read();
        let conn = self.database.connection()?;
        let repo = SqliteCategoryRepository::new(&conn);
        let ads = SqliteAdStore::new(&conn);
        op(&TreeReader::new(&repo, &ads))
    }

    // ==================== Mutations ====================

    pub fn ensure_root(&self, name: &str) -> TreeResult<Category> {
        self.write(|tree| tree.ensure_root(name))
    }

    pub fn insert(&self, new: NewCategory) -> TreeResult<Category> {
        self.write(|tree| tree.insert(new))
    }

    pub fn delete(&self, id: CategoryId) -> TreeResult<usize> {
        let removed = self.write(|tree| tree.delete(id))?;
        info!("Deleted category {} ({} categories removed)", id, removed);
        Ok(removed)
    }

    pub fn rebuild(&self) -> TreeResult<i64> {
        self.write(|tree| tree.rebuild())
    }

    /// Re-parents a category; the whole tree is rebuilt in the same transaction
    pub fn move_category(&self, id: CategoryId, new_parent_id: CategoryId) -> TreeResult<Category> {
        self.write(|tree| tree.move_category(id, new_parent_id))
    }

    /// Saves attribute edits. Structure (`parent_id`, `left`, `right`) is
    /// never written here; use [`move_category`](Self::move_category).
    pub fn update_category(&self, category: &Category, propagate: bool) -> TreeResult<Category> {
        self.write(|tree| tree.save(category, propagate))
    }

    pub fn propagate_permissions(&self, root_id: CategoryId, access: &AccessControl) -> TreeResult<usize> {
        self.write(|tree| tree.propagate(root_id, access))
    }

    // ==================== Reads ====================

    pub fn get(&self, id: CategoryId) -> TreeResult<Category> {
        self.read(|tree| tree.get(id))
    }

    pub fn get_children(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_children(id))
    }

    pub fn get_subtree(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_subtree(id))
    }

    pub fn get_subtree_cached(&self, id: CategoryId, cache: &mut SubtreeCache) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_subtree_cached(id, cache))
    }

    pub fn get_children_at_depth(&self, id: CategoryId, max_depth: usize) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_children_at_depth(id, max_depth))
    }

    pub fn get_ancestors(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_ancestors(id))
    }

    pub fn get_parent_id(&self, id: CategoryId) -> TreeResult<Option<CategoryId>> {
        self.read(|tree| tree.get_parent_id(id))
    }

    pub fn get_siblings(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.get_siblings(id))
    }

    pub fn breadcrumb(&self, id: CategoryId) -> TreeResult<Breadcrumb> {
        self.read(|tree| tree.breadcrumb(id))
    }

    pub fn is_used(&self, id: CategoryId) -> TreeResult<bool> {
        self.read(|tree| tree.is_used(id))
    }

    pub fn count_descendant_ads(
        &self,
        id: CategoryId,
        include_subtree: bool,
        only_active: bool,
    ) -> TreeResult<u64> {
        self.read(|tree| tree.count_descendant_ads(id, include_subtree, only_active))
    }

    pub fn visible_subtree(
        &self,
        id: CategoryId,
        checker: &dyn AccessCheck,
        required_level: u8,
    ) -> TreeResult<Vec<Category>> {
        self.read(|tree| tree.visible_subtree(id, checker, required_level))
    }

    /// Checks every nested-set invariant against the stored rows
    pub fn verify(&self) -> TreeResult<()> {
        let _guard = self.tree_lock.read();
        let conn = self.database.connection()?;
        TreeInspector::verify(&SqliteCategoryRepository::new(&conn))?;
        debug!("Category tree verified");
        Ok(())
    }
}
